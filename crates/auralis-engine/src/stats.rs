//! Render statistics shared between the render and control threads
//!
//! A deadline overrun is a quality degradation, not an error: the render
//! call still returns its block, the caller decides what to substitute, and
//! the miss shows up here as a metric.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic float for lock-free telemetry
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Lock-free render telemetry
#[derive(Debug, Default)]
pub struct RenderStats {
    blocks: AtomicU64,
    overruns: AtomicU64,
    last_block_secs: AtomicF64,
    peak_block_secs: AtomicF64,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rendered block against its deadline
    pub(crate) fn record(&self, elapsed: Duration, deadline: Duration) {
        let secs = elapsed.as_secs_f64();
        self.blocks.fetch_add(1, Ordering::Relaxed);
        self.last_block_secs.store(secs);
        if secs > self.peak_block_secs.load() {
            self.peak_block_secs.store(secs);
        }
        if elapsed > deadline {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "render overrun: block took {:.3} ms against a {:.3} ms deadline",
                secs * 1000.0,
                deadline.as_secs_f64() * 1000.0
            );
        }
    }

    /// Blocks rendered so far
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    /// Deadline overruns so far
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Consistent copy of all counters
    pub fn snapshot(&self) -> RenderStatsSnapshot {
        RenderStatsSnapshot {
            blocks: self.blocks(),
            overruns: self.overruns(),
            last_block_secs: self.last_block_secs.load(),
            peak_block_secs: self.peak_block_secs.load(),
        }
    }
}

/// Point-in-time view of [`RenderStats`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStatsSnapshot {
    pub blocks: u64,
    pub overruns: u64,
    pub last_block_secs: f64,
    pub peak_block_secs: f64,
}
