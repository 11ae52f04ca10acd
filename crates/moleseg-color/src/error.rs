//! Error types for moleseg-color

use thiserror::Error;

/// Errors that can occur during thresholding
#[derive(Debug, Error)]
pub enum ColorError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] moleseg_core::Error),

    /// Error from the smoothing stage
    #[error("filter error: {0}")]
    Filter(#[from] moleseg_filter::FilterError),

    /// Unsupported pixel depth for this operation
    #[error("unsupported depth: expected {expected}, got {actual}")]
    UnsupportedDepth { expected: &'static str, actual: u32 },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for thresholding operations
pub type ColorResult<T> = Result<T, ColorError>;
