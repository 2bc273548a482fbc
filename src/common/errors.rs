//! Error types for the application

use thiserror::Error;

/// Result type alias using our BotError
pub type Result<T> = std::result::Result<T, BotError>;

/// Main error type for order placement and supervision
#[derive(Error, Debug)]
pub enum BotError {
    /// Malformed or logically inconsistent input, caught before any network call
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A precision-adjusted value collapsed to zero or negative
    #[error("Precision adjustment failed: {0}")]
    Precision(String),

    /// The exchange refused a well-formed order; reason is surfaced verbatim
    #[error("Order rejected by exchange (code {code}): {reason}")]
    OrderRejected { code: i64, reason: String },

    /// Timeout, connection reset, 5xx, or rate limit; retried with backoff
    #[error("Transient network error: {0}")]
    Transient(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Convenience constructor for validation failures
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        BotError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error is worth retrying (timeouts, resets, 5xx, rate limits)
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Transient(_) => true,
            BotError::HttpRequest(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Process exit code for the CLI surface
    ///
    /// 0 success, 1 validation error, 2 exchange rejection,
    /// 3 connectivity failure after exhausted retries.
    pub fn exit_code(&self) -> i32 {
        match self {
            BotError::Validation { .. }
            | BotError::Precision(_)
            | BotError::Configuration(_) => 1,
            BotError::OrderRejected { .. } => 2,
            _ => 3,
        }
    }
}
