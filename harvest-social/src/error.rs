use harvest_http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocialError {
    /// Transport, decode, or non-200 API failure. `HttpError::Api` keeps the
    /// status and response body untouched.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
