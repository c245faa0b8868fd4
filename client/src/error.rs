use thiserror::Error;
use townsquare_shared::PostId;

/// The transport never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 from any endpoint: the stored token is missing, invalid or expired.
    #[error("session expired")]
    Unauthorized { detail: Option<String> },

    #[error("request rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(String),

    /// A 2xx body that lacks the fields the caller needs.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network(err.0)
    }
}

/// How a user action ended when it did not succeed.
///
/// The user has already been notified by the time one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("login required")]
    AuthRequired,

    #[error("declined by user")]
    Declined,

    #[error("invalid input: {0}")]
    Validation(&'static str),

    #[error("post {0} is not loaded in this timeline")]
    UnknownPost(PostId),

    #[error("an identical request is already in flight")]
    Busy,

    #[error("view was closed before the response arrived")]
    Stale,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ActionError::Api(ApiError::Unauthorized { .. }))
    }
}
