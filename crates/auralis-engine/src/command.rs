//! Scene mutation commands
//!
//! All scene edits cross from the control thread to the render thread as
//! values in an SPSC queue and are applied atomically at block boundaries.
//! Anything expensive to build (room impulse responses, HRTF tables) is
//! built control-side and shipped ready to swap in.

use std::sync::Arc;

use auralis_spatial::{
    AudioSource, HrtfTable, ListenerState, Position3D, RoomEngine, RoomModel,
};

use crate::arena::SourceHandle;

/// A scene edit, applied at the next block boundary
pub enum SceneCommand {
    /// Add a source at a pre-allocated slot
    AddSource {
        handle: SourceHandle,
        source: AudioSource,
    },
    /// Remove a source
    RemoveSource { handle: SourceHandle },
    /// Replace every field of a source (the id is preserved engine-side)
    UpdateSource {
        handle: SourceHandle,
        source: AudioSource,
    },
    /// Move a source
    MoveSource {
        handle: SourceHandle,
        position: Position3D,
        velocity: Position3D,
    },
    /// Replace the listener pose
    SetListener(ListenerState),
    /// Swap in a new room: the reverb engine was already built on the
    /// control thread from the model's synthesized impulse response
    SetRoom {
        model: RoomModel,
        engine: Box<RoomEngine>,
    },
    /// Swap in a new HRTF table
    SetHrtf(Arc<HrtfTable>),
}
