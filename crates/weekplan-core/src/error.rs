//! Unified error types for weekplan

use thiserror::Error;

/// Unified error type for all weekplan operations
#[derive(Error, Debug)]
pub enum PlannerError {
    // Store errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Store access denied: {0}")]
    AccessDenied(String),

    // Payload errors
    #[error("Corrupt payload under '{key}': {source}")]
    CorruptPayload {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // Input errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlannerError {
    /// Whether the error came from the backing store rather than the data in it
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::QuotaExceeded { .. } | Self::AccessDenied(_) | Self::Io(_)
        )
    }
}

/// Result type alias using PlannerError
pub type Result<T> = std::result::Result<T, PlannerError>;
