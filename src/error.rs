//! Error types for scrollfeed
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in scrollfeed
#[derive(Debug, Error)]
pub enum FeedError {
    /// The mock API rolled a simulated failure
    #[error("Simulated failure: the mock API rejected this request")]
    SimulatedFailure,

    /// Request parameters were missing or out of range
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Remote API answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport error talking to a remote API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A calendar date could not be parsed or computed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// HTTP status code this error maps to when served by the mock API
    pub fn status_code(&self) -> u16 {
        match self {
            FeedError::InvalidRequest(_) | FeedError::Json(_) | FeedError::InvalidDate(_) => 400,
            FeedError::Api { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Result type alias for scrollfeed operations
pub type Result<T> = std::result::Result<T, FeedError>;
