//! Error types shared across Auralis crates

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum AuralisError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("DSP error: {0}")]
    Dsp(String),
}

/// Result type alias
pub type AuralisResult<T> = Result<T, AuralisError>;
