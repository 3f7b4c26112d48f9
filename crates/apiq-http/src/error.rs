//! HTTP client error types.

use thiserror::Error;

/// Errors that can occur when making HTTP requests.
///
/// `Clone` so that query and mutation state snapshots can carry it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Failed to send the request or read the response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A `:name` segment of the path template had no value.
    #[error("Missing path parameter '{0}'")]
    MissingPathParam(String),

    /// HTTP error response.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Response validation failed: {0}")]
    Validation(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl FetchError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
