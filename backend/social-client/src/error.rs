/// Error types for the social client
///
/// Every wrapper around an external call returns one of these kinds instead of
/// swallowing the failure, so callers can decide what to show.
use storage_utils::StorageUrlError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocialError {
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SocialError {
    /// Generic message for the failure toast; details go to the log
    pub fn toast_message(&self) -> &'static str {
        match self {
            SocialError::AuthFailure(_) => "Sign in failed. Please try again.",
            SocialError::UploadFailure(_) => "Upload failed. Please try again.",
            _ => "Something went wrong. Please try again.",
        }
    }

    /// Map a backend HTTP status and message onto an error kind
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => SocialError::AuthFailure(message),
            404 => SocialError::NotFound(message),
            409 | 412 => SocialError::WriteConflict(message),
            400 | 422 => SocialError::InvalidInput(message),
            408 | 429 | 500..=599 => SocialError::NetworkFailure(message),
            _ => SocialError::Internal(format!("unexpected status {}: {}", status, message)),
        }
    }
}

impl From<reqwest::Error> for SocialError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            SocialError::NetworkFailure(err.to_string())
        } else if let Some(status) = err.status() {
            SocialError::from_status(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            SocialError::Internal(format!("response decode failed: {}", err))
        } else {
            SocialError::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SocialError {
    fn from(err: serde_json::Error) -> Self {
        SocialError::Internal(err.to_string())
    }
}

impl From<StorageUrlError> for SocialError {
    fn from(err: StorageUrlError) -> Self {
        SocialError::UploadFailure(err.to_string())
    }
}

/// Result type alias for client operations
pub type SocialResult<T> = Result<T, SocialError>;
