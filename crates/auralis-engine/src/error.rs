//! Engine error types

use thiserror::Error;

use auralis_spatial::SpatialError;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// All source slots are in use
    #[error("Source arena full: all {max} slots in use")]
    ArenaFull { max: usize },

    /// Handle refers to a removed or replaced source
    #[error("Stale source handle (slot {slot}, generation {generation})")]
    StaleHandle { slot: usize, generation: u32 },

    /// Control-to-render queue is full; retry after a block has rendered
    #[error("Command queue full")]
    CommandQueueFull,

    /// Bad construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spatialization failure
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Result type alias
pub type EngineResult<T> = Result<T, EngineError>;
