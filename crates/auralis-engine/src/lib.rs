//! Auralis Real-Time Engine
//!
//! Block-based spatial rendering with lock-free scene control:
//! - Fixed-capacity slot arena with generation-checked handles
//! - SPSC command queue, applied atomically at block boundaries
//! - HRTF tables and room impulse responses precomputed on the control
//!   thread and swapped in wholesale
//! - Deadline telemetry: overruns are metrics, never errors

mod arena;
mod command;
mod engine;
mod error;
mod stats;

pub use arena::{SlotAllocator, SourceArena, SourceHandle, DEFAULT_CAPACITY};
pub use command::SceneCommand;
pub use engine::{EngineConfig, EngineHandle, SpatialEngine, MAX_OUTPUT_CHANNELS};
pub use error::{EngineError, EngineResult};
pub use stats::{AtomicF64, RenderStats, RenderStatsSnapshot};
