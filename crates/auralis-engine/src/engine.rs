//! Block renderer and control handle
//!
//! [`SpatialEngine::new`] returns an engine/handle pair. The engine lives on
//! the render thread and turns per-source input buffers into one output
//! block per call; the [`EngineHandle`] lives on the control thread and
//! feeds it scene edits through a lock-free SPSC queue. Commands drain at
//! the top of `render_block`, so every edit lands exactly on a block
//! boundary and a render call only ever sees consistent scene state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rtrb::{Consumer, Producer, RingBuffer};

use auralis_core::{BlockSize, Sample, SampleRate};
use auralis_spatial::{
    AmbisonicOrder, AttenuationStage, AudioSource, FormatRenderer, HrtfTable, ListenerState,
    OutputBlock, OutputFormat, Position3D, RoomEngine, RoomModel, SourceFeed, SpatialError,
    SpatialMetrics,
};

use crate::arena::{SlotAllocator, SourceArena, SourceHandle, DEFAULT_CAPACITY};
use crate::command::SceneCommand;
use crate::error::{EngineError, EngineResult};
use crate::stats::{RenderStats, RenderStatsSnapshot};

/// Widest supported output layout (7.1)
pub const MAX_OUTPUT_CHANNELS: usize = 8;

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate, fixed for the engine's lifetime
    pub sample_rate: SampleRate,
    /// Render block size, fixed for the engine's lifetime
    pub block_size: BlockSize,
    /// Delivery format
    pub format: OutputFormat,
    /// Ambisonic order used when `format` is ambisonics
    pub ambisonic_order: AmbisonicOrder,
    /// Source slot capacity
    pub max_sources: usize,
    /// Initial room
    pub room: RoomModel,
    /// Seed for room impulse synthesis
    pub room_seed: u64,
    /// Command queue capacity
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            block_size: BlockSize::default(),
            format: OutputFormat::default(),
            ambisonic_order: AmbisonicOrder::default(),
            max_sources: DEFAULT_CAPACITY,
            room: RoomModel::default(),
            room_seed: 1,
            command_capacity: 256,
        }
    }
}

/// Render-side spatialization engine
pub struct SpatialEngine {
    sample_rate: f32,
    block_size: usize,
    format: OutputFormat,
    deadline: Duration,
    arena: SourceArena,
    listener: ListenerState,
    room_model: RoomModel,
    stage: AttenuationStage,
    hrtf: Arc<HrtfTable>,
    room: Box<RoomEngine>,
    renderer: FormatRenderer,
    command_rx: Consumer<SceneCommand>,
    stats: Arc<RenderStats>,
    // Preallocated per-slot scratch
    shaped: Vec<Vec<Sample>>,
    lefts: Vec<Vec<Sample>>,
    rights: Vec<Vec<Sample>>,
    metrics: Vec<SpatialMetrics>,
}

impl SpatialEngine {
    /// Build an engine/handle pair.
    ///
    /// All precomputation happens here, on the caller's (control) thread:
    /// the synthetic HRTF table and the initial room impulse response.
    pub fn new(config: EngineConfig) -> EngineResult<(Self, EngineHandle)> {
        if config.max_sources == 0 {
            return Err(EngineError::InvalidConfig(
                "max_sources must be at least 1".into(),
            ));
        }

        let sample_rate = config.sample_rate.as_f32();
        let block_size = config.block_size.as_usize();
        let deadline = config.block_size.deadline(config.sample_rate);

        let hrtf = Arc::new(HrtfTable::synthetic(config.sample_rate.as_u32()));
        let room = Box::new(RoomEngine::new(
            &config.room,
            sample_rate,
            block_size,
            MAX_OUTPUT_CHANNELS,
            config.room_seed,
        )?);
        let renderer = FormatRenderer::new(block_size, config.ambisonic_order)?;

        let (command_tx, command_rx) = RingBuffer::new(config.command_capacity.max(16));
        let stats = Arc::new(RenderStats::new());

        let engine = Self {
            sample_rate,
            block_size,
            format: config.format,
            deadline,
            arena: SourceArena::new(config.max_sources),
            listener: ListenerState::default(),
            room_model: config.room.clone(),
            stage: AttenuationStage::new(),
            hrtf,
            room,
            renderer,
            command_rx,
            stats: Arc::clone(&stats),
            shaped: vec![vec![0.0; block_size]; config.max_sources],
            lefts: vec![vec![0.0; block_size]; config.max_sources],
            rights: vec![vec![0.0; block_size]; config.max_sources],
            metrics: vec![SpatialMetrics::default(); config.max_sources],
        };

        let handle = EngineHandle {
            command_tx,
            allocator: SlotAllocator::new(config.max_sources),
            stats,
            sample_rate,
            block_size,
            room_seed: config.room_seed,
        };

        Ok((engine, handle))
    }

    /// Render one block.
    ///
    /// `inputs` pairs each live source's handle with its raw buffer for this
    /// block (every buffer exactly `block_size` samples). Stale handles are
    /// skipped silently; a missing HRTF direction or empty room degrade to
    /// silence, never to an error. Pending scene commands are applied before
    /// any audio is touched.
    pub fn render_block(
        &mut self,
        inputs: &[(SourceHandle, &[Sample])],
    ) -> EngineResult<OutputBlock> {
        let start = Instant::now();
        self.apply_commands();

        // Stage 1: attenuation / directivity into per-slot scratch.
        let mut count = 0;
        for (handle, input) in inputs {
            if input.len() != self.block_size {
                return Err(SpatialError::BufferSizeMismatch {
                    expected: self.block_size,
                    got: input.len(),
                }
                .into());
            }
            if count >= self.shaped.len() {
                log::warn!("more input buffers than source slots, ignoring extras");
                break;
            }
            let Some(source) = self.arena.get(*handle) else {
                // Removed or replaced since the caller captured the handle.
                continue;
            };

            let shaped = &mut self.shaped[count];
            shaped.copy_from_slice(input);
            self.metrics[count] = self.stage.shape(shaped, source, &self.listener);
            count += 1;
        }

        let output = if self.format == OutputFormat::Ambisonics {
            // Ambisonics bypasses HRTF and room processing.
            let sources: Vec<(&[Sample], SpatialMetrics)> = (0..count)
                .map(|i| (self.shaped[i].as_slice(), self.metrics[i]))
                .collect();
            self.renderer.encode_ambisonics(&sources)?
        } else {
            // Stage 2: HRTF synthesis per source.
            for i in 0..count {
                let m = self.metrics[i];
                self.hrtf.spatialize(
                    &self.shaped[i],
                    m.azimuth,
                    m.elevation,
                    &mut self.lefts[i],
                    &mut self.rights[i],
                )?;
            }

            // Stage 3: mix to the delivery layout, then the reverb bus.
            let feeds: Vec<SourceFeed<'_>> = (0..count)
                .map(|i| SourceFeed {
                    metrics: self.metrics[i],
                    left: &self.lefts[i],
                    right: &self.rights[i],
                })
                .collect();
            let mut mixed = self.renderer.mix(&feeds, self.format)?;
            self.room.apply(&mut mixed.channels)?;
            mixed.finalize()
        };

        self.stats.record(start.elapsed(), self.deadline);
        Ok(output)
    }

    /// Drain pending scene commands; runs at block boundaries only.
    fn apply_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.pop() {
            match cmd {
                SceneCommand::AddSource { handle, source } => {
                    self.arena.insert(handle, source);
                }
                SceneCommand::RemoveSource { handle } => {
                    self.arena.remove(handle);
                }
                SceneCommand::UpdateSource { handle, source } => {
                    if let Some(existing) = self.arena.get_mut(handle) {
                        let id = existing.id;
                        *existing = source;
                        existing.id = id;
                    }
                }
                SceneCommand::MoveSource {
                    handle,
                    position,
                    velocity,
                } => {
                    if let Some(existing) = self.arena.get_mut(handle) {
                        existing.position = position;
                        existing.velocity = velocity;
                    }
                }
                SceneCommand::SetListener(listener) => {
                    self.listener = listener;
                }
                SceneCommand::SetRoom { model, engine } => {
                    log::debug!("room changed, swapping in regenerated impulse response");
                    self.room_model = model;
                    self.room = engine;
                }
                SceneCommand::SetHrtf(table) => {
                    self.hrtf = table;
                }
            }
        }
    }

    /// Configured block size
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Configured sample rate
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Delivery format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Number of live sources (as of the last applied commands)
    pub fn source_count(&self) -> usize {
        self.arena.len()
    }

    /// Current room model (as of the last applied commands)
    pub fn room_model(&self) -> &RoomModel {
        &self.room_model
    }
}

/// Control-side handle: scene edits and telemetry
pub struct EngineHandle {
    command_tx: Producer<SceneCommand>,
    allocator: SlotAllocator,
    stats: Arc<RenderStats>,
    sample_rate: f32,
    block_size: usize,
    room_seed: u64,
}

impl EngineHandle {
    /// Add a source; its unique id is assigned here and never reused.
    pub fn add_source(&mut self, mut source: AudioSource) -> EngineResult<SourceHandle> {
        let max = self.allocator.capacity();
        let Some((handle, id)) = self.allocator.allocate() else {
            return Err(EngineError::ArenaFull { max });
        };
        source.id = id;

        if let Err(err) = self.send(SceneCommand::AddSource { handle, source }) {
            self.allocator.release(handle);
            return Err(err);
        }
        Ok(handle)
    }

    /// Remove a source
    pub fn remove_source(&mut self, handle: SourceHandle) -> EngineResult<()> {
        if !self.allocator.release(handle) {
            return Err(EngineError::StaleHandle {
                slot: handle.slot(),
                generation: handle.generation(),
            });
        }
        self.send(SceneCommand::RemoveSource { handle })
    }

    /// Replace a source's parameters wholesale (atomic from the render
    /// path's point of view; the engine preserves the original id)
    pub fn update_source(
        &mut self,
        handle: SourceHandle,
        source: AudioSource,
    ) -> EngineResult<()> {
        self.check_live(handle)?;
        self.send(SceneCommand::UpdateSource { handle, source })
    }

    /// Move a source
    pub fn move_source(
        &mut self,
        handle: SourceHandle,
        position: Position3D,
        velocity: Position3D,
    ) -> EngineResult<()> {
        self.check_live(handle)?;
        self.send(SceneCommand::MoveSource {
            handle,
            position,
            velocity,
        })
    }

    /// Push a listener pose update
    pub fn set_listener(&mut self, listener: ListenerState) -> EngineResult<()> {
        self.send(SceneCommand::SetListener(listener))
    }

    /// Replace the room. The impulse response and reverb engine are built
    /// here, on the control thread; the render thread only swaps pointers.
    pub fn set_room(&mut self, model: RoomModel) -> EngineResult<()> {
        let engine = RoomEngine::new(
            &model,
            self.sample_rate,
            self.block_size,
            MAX_OUTPUT_CHANNELS,
            self.room_seed,
        )?;
        self.send(SceneCommand::SetRoom {
            model,
            engine: Box::new(engine),
        })
    }

    /// Substitute an HRTF table (e.g. a measured dataset)
    pub fn set_hrtf_table(&mut self, table: HrtfTable) -> EngineResult<()> {
        self.send(SceneCommand::SetHrtf(Arc::new(table)))
    }

    /// Whether a handle still refers to a live source
    pub fn is_live(&self, handle: SourceHandle) -> bool {
        self.allocator.is_live(handle)
    }

    /// Number of live sources (as issued; the render side catches up at the
    /// next block boundary)
    pub fn live_sources(&self) -> usize {
        self.allocator.live_count()
    }

    /// Render telemetry snapshot
    pub fn stats(&self) -> RenderStatsSnapshot {
        self.stats.snapshot()
    }

    fn check_live(&self, handle: SourceHandle) -> EngineResult<()> {
        if self.allocator.is_live(handle) {
            Ok(())
        } else {
            Err(EngineError::StaleHandle {
                slot: handle.slot(),
                generation: handle.generation(),
            })
        }
    }

    fn send(&mut self, command: SceneCommand) -> EngineResult<()> {
        self.command_tx
            .push(command)
            .map_err(|_| EngineError::CommandQueueFull)
    }
}
