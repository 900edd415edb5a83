//! Slot arena for scene sources
//!
//! Sources live in fixed-capacity slots addressed by a [`SourceHandle`]
//! (slot index + generation). Slot assignment happens control-side in the
//! [`SlotAllocator`], so a handle is known synchronously when a source is
//! added; the render-side [`SourceArena`] just honors it. Generations bump
//! on release, so a stale handle can never alias a newer source.

use auralis_spatial::AudioSource;

/// Default number of source slots
pub const DEFAULT_CAPACITY: usize = 64;

/// Stable handle to a scene source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    slot: u16,
    generation: u32,
}

impl SourceHandle {
    /// Slot index
    pub fn slot(self) -> usize {
        self.slot as usize
    }

    /// Generation the handle was issued at
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Control-side slot bookkeeping
///
/// Owns the free list, generation counters, and the monotonically increasing
/// source id. Only the control thread touches this.
pub struct SlotAllocator {
    free: Vec<u16>,
    generations: Vec<u32>,
    live: Vec<bool>,
    next_id: u64,
}

impl SlotAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: (0..capacity as u16).rev().collect(),
            generations: vec![0; capacity],
            live: vec![false; capacity],
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    pub fn live_count(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Claim a slot. Returns the handle and a fresh unique source id, or
    /// `None` when every slot is in use.
    pub fn allocate(&mut self) -> Option<(SourceHandle, u64)> {
        let slot = self.free.pop()?;
        self.live[slot as usize] = true;
        let id = self.next_id;
        self.next_id += 1;
        Some((
            SourceHandle {
                slot,
                generation: self.generations[slot as usize],
            },
            id,
        ))
    }

    /// Whether a handle still refers to a live slot
    pub fn is_live(&self, handle: SourceHandle) -> bool {
        self.live
            .get(handle.slot())
            .copied()
            .unwrap_or(false)
            && self.generations[handle.slot()] == handle.generation
    }

    /// Release a slot, bumping its generation. Returns false for stale
    /// handles.
    pub fn release(&mut self, handle: SourceHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = handle.slot();
        self.live[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.slot);
        true
    }
}

/// Render-side source storage
///
/// Fixed capacity, generation-checked access, touched only by the render
/// thread while it applies queued commands at block boundaries.
pub struct SourceArena {
    slots: Vec<Option<(u32, AudioSource)>>,
}

impl SourceArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Place a source in the handle's slot
    pub fn insert(&mut self, handle: SourceHandle, source: AudioSource) {
        if let Some(slot) = self.slots.get_mut(handle.slot()) {
            *slot = Some((handle.generation(), source));
        }
    }

    /// Remove the source a handle refers to, if the generation matches
    pub fn remove(&mut self, handle: SourceHandle) -> Option<AudioSource> {
        let slot = self.slots.get_mut(handle.slot())?;
        match slot {
            Some((generation, _)) if *generation == handle.generation() => {
                slot.take().map(|(_, source)| source)
            }
            _ => None,
        }
    }

    /// Get the source a handle refers to, if the generation matches
    pub fn get(&self, handle: SourceHandle) -> Option<&AudioSource> {
        match self.slots.get(handle.slot())? {
            Some((generation, source)) if *generation == handle.generation() => Some(source),
            _ => None,
        }
    }

    /// Mutable access, generation-checked
    pub fn get_mut(&mut self, handle: SourceHandle) -> Option<&mut AudioSource> {
        match self.slots.get_mut(handle.slot())? {
            Some((generation, source)) if *generation == handle.generation() => Some(source),
            _ => None,
        }
    }
}
