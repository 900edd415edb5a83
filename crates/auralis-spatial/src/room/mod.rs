//! Room acoustics: impulse synthesis and convolution reverb
//!
//! A [`RoomIr`] is synthesized from the [`RoomModel`] — early-reflection
//! spikes plus a late tail of exponentially decaying filtered noise — and a
//! [`RoomEngine`] convolves audio with it at a fixed wet gain.
//!
//! Synthesis is explicit precomputation: it runs on the control thread when
//! the room changes and the result is cached until the next change. All
//! randomness comes from an injected seed so the same room and seed always
//! produce the same impulse response.

use std::sync::Arc;

use auralis_core::Sample;
use auralis_dsp::{FftConvolver, MonoProcessor, OnePole, Processor, SeededNoise};

use crate::error::{SpatialError, SpatialResult};
use crate::scene::RoomModel;

/// Speed of sound used for geometric reflection times, m/s
const SPEED_OF_SOUND_MS: f32 = 343.0;

/// Upper bound on synthesized tail length in seconds
const MAX_TAIL_SECONDS: f32 = 6.0;

/// Room impulse response
#[derive(Debug, Clone)]
pub struct RoomIr {
    samples: Vec<Sample>,
    /// Length of the early-reflection window in samples
    early_len: usize,
    seed: u64,
}

impl RoomIr {
    /// Synthesize an impulse response for `room`.
    ///
    /// Parametric synthesis (reflection times from the box geometry) is used
    /// when early reflections are enabled and the dimensions are usable;
    /// otherwise the default stochastic model. Either way the late tail
    /// decays at `ln(0.001) / (rt60_mid * sample_rate)` per sample — the
    /// -60 dB envelope — and is scaled by the diffusion parameter.
    pub fn synthesize(room: &RoomModel, sample_rate: f32, seed: u64) -> Self {
        let mut noise = SeededNoise::new(seed);

        let (mut samples, early_len) = if room.early_reflections && room.has_dimensions() {
            Self::parametric_early(room, sample_rate)
        } else {
            Self::default_early(room, sample_rate, &mut noise)
        };

        let rt60 = room.rt60.mid.max(0.0);
        if rt60 > 0.0 {
            let tail_len = ((rt60 * sample_rate) as usize)
                .min((MAX_TAIL_SECONDS * sample_rate) as usize);
            let decay_rate = (0.001_f32).ln() / (rt60 * sample_rate);

            // High-band absorption darkens the tail.
            let cutoff = 1500.0 + 6500.0 * (1.0 - room.absorption.high).clamp(0.0, 1.0);
            let mut lowpass = OnePole::new(cutoff, sample_rate);

            samples.resize(early_len + tail_len, 0.0);
            for n in 0..tail_len {
                let colored = lowpass.process_sample(noise.next_sample());
                samples[early_len + n] +=
                    colored * (decay_rate * n as f32).exp() * room.diffusion;
            }
        }

        if samples.is_empty() {
            samples.push(0.0);
        }

        Self {
            samples,
            early_len,
            seed,
        }
    }

    /// Wrap an externally supplied (e.g. measured) impulse response.
    pub fn from_samples(samples: Vec<Sample>, early_len: usize) -> Self {
        let early_len = early_len.min(samples.len());
        Self {
            samples,
            early_len,
            seed: 0,
        }
    }

    /// Default model: ~20 spikes (scaled by density) at random delays of
    /// 10-60 ms with random amplitudes of 0.1-0.4.
    fn default_early(
        room: &RoomModel,
        sample_rate: f32,
        noise: &mut SeededNoise,
    ) -> (Vec<Sample>, usize) {
        let window = (0.060 * sample_rate) as usize + 1;
        let mut samples = vec![0.0_f32; window];

        let count = ((20.0 * room.density).round() as usize).clamp(1, 64);
        for _ in 0..count {
            let delay_s = noise.range(0.010, 0.060);
            let amplitude = noise.range(0.1, 0.4);
            let idx = ((delay_s * sample_rate) as usize).min(window - 1);
            samples[idx] += amplitude;
        }

        (samples, window)
    }

    /// Parametric model: first and second axial bounces per room dimension,
    /// with reflection strength `0.5 * (1 - mid_absorption)`.
    fn parametric_early(room: &RoomModel, sample_rate: f32) -> (Vec<Sample>, usize) {
        let strength = 0.5 * (1.0 - room.absorption.mid).clamp(0.0, 1.0);
        let mut spikes: Vec<(usize, f32)> = Vec::new();

        for dim in [room.width, room.height, room.depth] {
            let t = dim / SPEED_OF_SOUND_MS;
            let first = (t * sample_rate) as usize;
            let second = (2.0 * t * sample_rate) as usize;
            spikes.push((first, strength));
            spikes.push((second, strength * (1.0 - room.absorption.mid)));
        }

        let window = spikes.iter().map(|&(i, _)| i).max().unwrap_or(0) + 1;
        let mut samples = vec![0.0_f32; window];
        for (idx, gain) in spikes {
            samples[idx] += gain;
        }

        (samples, window)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the early-reflection window in samples
    pub fn early_len(&self) -> usize {
        self.early_len
    }

    /// Seed the impulse was synthesized from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Convolution reverb over a cached room impulse response.
///
/// Holds one streaming convolver per output channel so reverb tails carry
/// across blocks. Replace the whole engine (built on the control thread) to
/// change rooms; the render thread never synthesizes impulse responses.
pub struct RoomEngine {
    ir: Arc<RoomIr>,
    convolvers: Vec<FftConvolver>,
    wet: Vec<Sample>,
    block_size: usize,
}

impl RoomEngine {
    /// Fixed wet gain of the reverb return
    pub const WET_GAIN: f32 = 0.3;

    /// Synthesize the room IR and build convolvers for `channels` outputs.
    pub fn new(
        room: &RoomModel,
        sample_rate: f32,
        block_size: usize,
        channels: usize,
        seed: u64,
    ) -> SpatialResult<Self> {
        let ir = Arc::new(RoomIr::synthesize(room, sample_rate, seed));
        Self::from_ir(ir, block_size, channels)
    }

    /// Build from an existing impulse response.
    pub fn from_ir(ir: Arc<RoomIr>, block_size: usize, channels: usize) -> SpatialResult<Self> {
        let convolvers = (0..channels.max(1))
            .map(|_| FftConvolver::new(ir.samples(), block_size))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ir,
            convolvers,
            wet: vec![0.0; block_size],
            block_size,
        })
    }

    pub fn ir(&self) -> &Arc<RoomIr> {
        &self.ir
    }

    pub fn channels(&self) -> usize {
        self.convolvers.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Apply reverb to a set of channel buffers: `out = dry + 0.3 * wet`.
    pub fn apply(&mut self, channels: &mut [Vec<Sample>]) -> SpatialResult<()> {
        if channels.len() > self.convolvers.len() {
            return Err(SpatialError::InvalidChannelCount {
                expected: self.convolvers.len(),
                got: channels.len(),
            });
        }
        for (idx, buffer) in channels.iter_mut().enumerate() {
            self.apply_channel(idx, buffer)?;
        }
        Ok(())
    }

    /// Stereo convenience over the first two convolvers.
    pub fn apply_stereo(
        &mut self,
        left: &mut [Sample],
        right: &mut [Sample],
    ) -> SpatialResult<()> {
        if self.convolvers.len() < 2 {
            return Err(SpatialError::InvalidChannelCount {
                expected: 2,
                got: self.convolvers.len(),
            });
        }
        self.apply_channel(0, left)?;
        self.apply_channel(1, right)
    }

    fn apply_channel(&mut self, idx: usize, buffer: &mut [Sample]) -> SpatialResult<()> {
        let Self {
            convolvers, wet, ..
        } = self;
        convolvers[idx].process_block(buffer, wet)?;
        for (dry, &w) in buffer.iter_mut().zip(wet.iter()) {
            *dry += Self::WET_GAIN * w;
        }
        Ok(())
    }

    /// Clear all reverb tails
    pub fn reset(&mut self) {
        for conv in &mut self.convolvers {
            conv.reset();
        }
    }
}
