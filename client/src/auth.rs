use townsquare_shared::{AuthResponse, SignupRequest};
use tracing::info;

use crate::context::Context;
use crate::error::{ActionError, ApiError};
use crate::messages;
use crate::notify::{Route, ToastKind};

/// Login, signup and logout against the session store.
#[derive(Clone)]
pub struct Auth {
    ctx: Context,
}

impl Auth {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// `identifier` may be an email address or a username.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<String, ActionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            self.ctx.notify(ToastKind::Error, messages::MISSING_CREDENTIALS);
            return Err(ActionError::Validation(messages::MISSING_CREDENTIALS));
        }
        let result = self.ctx.api.login(identifier, password).await;
        self.finish(result, messages::LOGIN_SUCCESS, messages::LOGIN_FAILED)
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ActionError> {
        let request = SignupRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            self.ctx.notify(ToastKind::Error, messages::MISSING_CREDENTIALS);
            return Err(ActionError::Validation(messages::MISSING_CREDENTIALS));
        }
        let result = self.ctx.api.signup(&request).await;
        self.finish(result, messages::SIGNUP_SUCCESS, messages::SIGNUP_FAILED)
    }

    pub fn logout(&self) {
        self.ctx.session().clear();
        info!("logged out");
        self.ctx.notify(ToastKind::Info, messages::LOGGED_OUT);
    }

    fn finish(
        &self,
        result: Result<AuthResponse, ApiError>,
        success: &str,
        fallback: &'static str,
    ) -> Result<String, ActionError> {
        match result {
            Ok(auth) if !auth.token.is_empty() => {
                self.ctx.session().store(&auth.token, &auth.username);
                info!(username = %auth.username, "session started");
                self.ctx.notify(ToastKind::Success, success);
                Ok(auth.username)
            }
            Ok(_) => {
                self.ctx.notify(ToastKind::Error, fallback);
                Err(ActionError::Validation(fallback))
            }
            // A 401 here means bad credentials, not an expired session.
            Err(ApiError::Unauthorized { detail }) => {
                self.ctx
                    .notify(ToastKind::Error, detail.as_deref().unwrap_or(fallback));
                Err(ActionError::Api(ApiError::Unauthorized { detail }))
            }
            Err(err) => {
                self.ctx.report(&err, fallback);
                Err(err.into())
            }
        }
    }

    /// Where to send the user after a successful login.
    pub fn landing(&self) -> Route {
        Route::Feed
    }
}
