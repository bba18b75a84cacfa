use thiserror::Error;

use crate::models::FailureReason;

/// Application-wide error types for partscout.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client could not be built or the request could not be sent.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The vendor answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The vendor served an anti-bot page instead of results.
    #[error("Blocked by anti-bot check (marker: {0})")]
    Blocked(String),

    /// The response was well-formed but listed no matching items.
    #[error("No matching items found")]
    NotFound,

    /// Expected markup or embedded data was missing.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The query was empty or blank.
    #[error("Query must not be empty")]
    InvalidQuery,

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The reply could not be delivered to the messaging platform.
    #[error("Delivery error: {0}")]
    DeliveryError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Collapse this error into the coarse category shown to the user.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            AppError::HttpError(_)
            | AppError::HttpStatus { .. }
            | AppError::Timeout(_)
            | AppError::NetworkError(_)
            | AppError::DeliveryError(_) => FailureReason::NetworkError,
            AppError::Blocked(_) => FailureReason::Blocked,
            AppError::NotFound => FailureReason::NotFound,
            AppError::ParseError(_)
            | AppError::SerializationError(_)
            | AppError::InvalidQuery
            | AppError::ConfigError(_) => FailureReason::ParseError,
        }
    }

    /// Short detail worth showing next to the reason, if any.
    ///
    /// Reasons that already say everything (`NotFound`) return `None`.
    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::NotFound => None,
            AppError::HttpStatus { status, .. } => Some(format!("HTTP {status}")),
            AppError::Timeout(secs) => Some(format!("timed out after {secs}s")),
            AppError::Blocked(marker) => Some(format!("marker \"{marker}\"")),
            other => Some(other.to_string()),
        }
    }
}
