use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("ClientBuild: {source}")]
    ClientBuild { source: reqwest::Error },

    #[error("RequestSend: {source}")]
    RequestSend { source: reqwest::Error },

    #[error("ResponseRead: {source}")]
    ResponseRead { source: reqwest::Error },

    #[error("Decode: {source}")]
    Decode { source: serde_json::Error },

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("no csrftoken cookie in response")]
    MissingCsrfToken,

    #[error("login required, session is no longer valid")]
    LoginRequired,

    #[error("user @{username} not found")]
    UserNotFound { username: String },

    #[error("follower paging revisited cursor {cursor}")]
    CursorLoop { cursor: String },

    #[error("two-factor login rejected: {reason}")]
    TwoFactorRejected { reason: String },
}

impl ApiError {
    /// Whether the error means the session must be replaced before retrying.
    pub fn is_login_required(&self) -> bool {
        matches!(self, ApiError::LoginRequired)
    }
}
