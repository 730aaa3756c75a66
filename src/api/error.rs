//! Error types for the platform API

use thiserror::Error;

/// Errors that can occur when talking to the course platform
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token is stored
    #[error("Not logged in. Run `course-navigator login` first")]
    NotLoggedIn,

    /// Failed to access system keyring
    #[error("Failed to access keyring: {0}")]
    KeyringError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Token rejected by the platform
    #[error("Session expired or invalid. Please log in again")]
    Unauthorized,

    /// Content requires a premium plan
    #[error("Premium content: {0}")]
    Forbidden(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform
    #[error("Rate limited{}", retry_hint(.retry_after_seconds))]
    RateLimited {
        /// Seconds to wait before retrying, when the server says so
        retry_after_seconds: Option<u64>,
    },

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or detail message
        message: String,
    },

    /// Payload decoded but failed validation
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn retry_hint(retry_after_seconds: &Option<u64>) -> String {
    match retry_after_seconds {
        Some(secs) => format!(". Retry after {} seconds", secs),
        None => ". Please try again later".to_string(),
    }
}

impl ApiError {
    /// Check if this error is recoverable (user can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::RequestError(_))
    }

    /// Check if this error requires re-authentication
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ApiError::NotLoggedIn | ApiError::Unauthorized)
    }
}
