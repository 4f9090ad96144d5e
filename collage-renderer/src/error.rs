//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or exporting a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Export pipeline failed (stage not ready, rasterization,
    /// encoding).
    #[error("Export failed: {0}")]
    Export(String),

    /// Image decode or texture handling failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),
}
