//! Error types for collage operations.

use thiserror::Error;

/// Result type for collage operations.
pub type CollageResult<T> = Result<T, CollageError>;

/// Errors that can occur in collage operations.
#[derive(Debug, Error)]
pub enum CollageError {
    /// Element not found on the page.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid element operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Page serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Preview fetch or decode failed.
    #[error("Failed to load resource: {0}")]
    ResourceLoad(String),

    /// Backing store rejected a save or load.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
