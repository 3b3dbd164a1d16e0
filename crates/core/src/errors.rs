//! Error types for the quote domain.

use thiserror::Error;

/// Result type alias for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Errors raised by the store, the viewer, import/export and sync.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Key-value slot could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input rejected before any state change
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record (or pending conflict) with this identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or non-success response from the remote collection
    #[error("Transport error: {message}")]
    Transport { message: String, retryable: bool },
}

impl QuoteError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Storage(_) => true,
            Self::Json(_) | Self::Validation(_) | Self::NotFound(_) => false,
        }
    }
}
