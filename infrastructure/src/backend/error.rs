//! Error types for the backend adapter

use kubechat_application::{ApiError, StreamError};
use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid session cookie: {0}")]
    InvalidCookie(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Failed to parse response: {error}\nRaw response: {raw}")]
    ParseError { error: String, raw: String },

    #[error("Request rejected by backend: {0}")]
    Rejected(String),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status(status) => ApiError::Status(status),
            BackendError::Rejected(reason) => ApiError::Rejected(reason),
            BackendError::ParseError { error, .. } => ApiError::InvalidResponse(error),
            other => ApiError::Request(other.to_string()),
        }
    }
}

impl From<BackendError> for StreamError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status(status) => StreamError::Status(status),
            other => StreamError::Network(other.to_string()),
        }
    }
}
