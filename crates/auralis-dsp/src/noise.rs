//! Seeded noise generation
//!
//! Room impulse synthesis must be reproducible: the same room model and seed
//! always yield the same impulse response. All randomness therefore flows
//! through an injected [`SeededNoise`] rather than ambient thread RNG.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{MonoProcessor, Processor};
use auralis_core::Sample;

/// Deterministic noise source backed by ChaCha8.
pub struct SeededNoise {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next white-noise sample in [-1, 1)
    pub fn next_sample(&mut self) -> Sample {
        self.rng.random_range(-1.0..1.0)
    }

    /// Uniform value in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// Uniform integer in [lo, hi)
    pub fn range_usize(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// Fill a buffer with white noise
    pub fn fill(&mut self, buffer: &mut [Sample]) {
        for s in buffer.iter_mut() {
            *s = self.next_sample();
        }
    }

    /// Restart the sequence from the original seed
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

/// One-pole low-pass filter, used to color noise tails.
pub struct OnePole {
    coeff: f32,
    state: Sample,
}

impl OnePole {
    /// Create a low-pass with the given cutoff
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz.max(1.0));
        let dt = 1.0 / sample_rate;
        Self {
            coeff: dt / (rc + dt),
            state: 0.0,
        }
    }
}

impl Processor for OnePole {
    fn reset(&mut self) {
        self.state = 0.0;
    }
}

impl MonoProcessor for OnePole {
    fn process_sample(&mut self, input: Sample) -> Sample {
        self.state += self.coeff * (input - self.state);
        self.state
    }
}
