//! Error types for spatial audio processing

use thiserror::Error;

/// Spatial audio error types
#[derive(Error, Debug)]
pub enum SpatialError {
    /// Invalid channel count
    #[error("Invalid channel count: expected {expected}, got {got}")]
    InvalidChannelCount { expected: usize, got: usize },

    /// Invalid Ambisonic order
    #[error("Invalid Ambisonic order: {0} (max supported: 7)")]
    InvalidAmbisonicOrder(usize),

    /// Buffer size mismatch
    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    /// Invalid block size
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// Processing error
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl From<auralis_core::AuralisError> for SpatialError {
    fn from(err: auralis_core::AuralisError) -> Self {
        match err {
            auralis_core::AuralisError::BufferSizeMismatch { expected, got } => {
                SpatialError::BufferSizeMismatch { expected, got }
            }
            auralis_core::AuralisError::InvalidBlockSize(size) => {
                SpatialError::InvalidBlockSize(size)
            }
            other => SpatialError::ProcessingError(other.to_string()),
        }
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;
