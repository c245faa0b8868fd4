use std::rc::Rc;

use tracing::{debug, warn};

use crate::api::{ApiClient, Transport};
use crate::error::{ActionError, ApiError};
use crate::messages;
use crate::notify::{Navigator, Notifier, Route, ToastKind};
use crate::session::SessionStore;

/// Everything a user action needs from the outside world. Cheap to clone;
/// each view gets its own copy.
#[derive(Clone)]
pub struct Context {
    pub api: ApiClient,
    pub notifier: Rc<dyn Notifier>,
    pub navigator: Rc<dyn Navigator>,
}

impl Context {
    pub fn new(
        transport: Rc<dyn Transport>,
        session: Rc<dyn SessionStore>,
        notifier: Rc<dyn Notifier>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            api: ApiClient::new(transport, session),
            notifier,
            navigator,
        }
    }

    pub fn session(&self) -> &Rc<dyn SessionStore> {
        self.api.session()
    }

    pub fn notify(&self, kind: ToastKind, message: &str) {
        self.notifier.notify(kind, message);
    }

    /// The stored token, or a login redirect when there is none. Nothing is
    /// sent to the server in the latter case.
    pub fn require_token(&self) -> Result<String, ActionError> {
        match self.session().token() {
            Some(token) => Ok(token),
            None => {
                debug!("no session token, redirecting to login");
                self.notify(ToastKind::Info, messages::LOGIN_REQUIRED);
                self.navigator.redirect(Route::Login);
                Err(ActionError::AuthRequired)
            }
        }
    }

    /// Surface a failed call to the user. A 401 also sends them to login.
    pub fn report(&self, err: &ApiError, fallback: &str) {
        warn!(error = %err, "action failed");
        match err {
            ApiError::Unauthorized { detail } => {
                self.notify(
                    ToastKind::Error,
                    detail.as_deref().unwrap_or(messages::SESSION_EXPIRED),
                );
                self.navigator.redirect(Route::Login);
            }
            ApiError::Rejected { message, .. } => {
                self.notify(ToastKind::Error, message.as_deref().unwrap_or(fallback));
            }
            ApiError::Network(_) => self.notify(ToastKind::Error, messages::NETWORK),
            ApiError::Decode(_) => self.notify(ToastKind::Error, fallback),
        }
    }
}
