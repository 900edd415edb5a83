//! HRTF table: directionally-indexed impulse responses
//!
//! The table holds one [`HrirPair`] per point of a fixed angular grid. With
//! no measured dataset loaded, every entry is synthesized from an ITD/ILD
//! head model plus frequency-domain head-shadow and pinna shaping. A measured
//! dataset can be substituted entry by entry via [`HrtfTable::insert`].
//!
//! Generation is explicit precomputation: tables are built by the control
//! plane at configuration time and are read-only during rendering.

use std::collections::HashMap;

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

use auralis_core::Sample;
use auralis_dsp::convolve_into;

use super::HrirPair;
use crate::error::{SpatialError, SpatialResult};

/// Angular grid resolution in degrees
pub const GRID_STEP_DEG: f32 = 15.0;

/// Head radius of the synthetic model in meters
pub const HEAD_RADIUS_M: f32 = 0.085;

/// Speed of sound in m/s
pub const SPEED_OF_SOUND_MS: f32 = 343.0;

/// Synthetic impulse response length in samples
const FILTER_LEN: usize = 128;

/// HRTF table indexed by (azimuth, elevation) grid point
pub struct HrtfTable {
    /// HRIR entries keyed by (azimuth_idx, elevation_idx)
    hrirs: HashMap<(i32, i32), HrirPair>,
    /// Sample rate the entries were built for
    sample_rate: f32,
    /// Longest filter in the table
    filter_length: usize,
}

impl HrtfTable {
    /// Create an empty table
    pub fn new(sample_rate: u32) -> Self {
        Self {
            hrirs: HashMap::new(),
            sample_rate: sample_rate as f32,
            filter_length: 0,
        }
    }

    /// Build the default synthetic table covering the full grid:
    /// azimuth [-180, 180], elevation [-90, 90], 15 degree steps.
    pub fn synthetic(sample_rate: u32) -> Self {
        let mut table = Self::new(sample_rate);
        let az_steps = (180.0 / GRID_STEP_DEG) as i32;
        let el_steps = (90.0 / GRID_STEP_DEG) as i32;

        for az_idx in -az_steps..=az_steps {
            for el_idx in -el_steps..=el_steps {
                let azimuth = az_idx as f32 * GRID_STEP_DEG;
                let elevation = el_idx as f32 * GRID_STEP_DEG;
                let pair = table.synthesize_hrir(azimuth, elevation);
                table.hrirs.insert((az_idx, el_idx), pair);
            }
        }
        table.filter_length = FILTER_LEN;
        log::debug!(
            "synthesized HRTF table: {} entries at {} Hz",
            table.hrirs.len(),
            sample_rate
        );
        table
    }

    /// Insert a (possibly measured) HRIR at the nearest grid point
    pub fn insert(&mut self, azimuth: f32, elevation: f32, pair: HrirPair) {
        let length = pair.length();
        self.hrirs.insert(Self::grid_key(azimuth, elevation), pair);
        self.filter_length = self.filter_length.max(length);
    }

    /// Number of entries
    pub fn entry_count(&self) -> usize {
        self.hrirs.len()
    }

    /// Longest filter in the table
    pub fn filter_length(&self) -> usize {
        self.filter_length
    }

    /// Sample rate the table was built for
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Nearest grid key for a direction; azimuth wraps, elevation clamps.
    fn grid_key(azimuth: f32, elevation: f32) -> (i32, i32) {
        let azimuth = (azimuth + 180.0).rem_euclid(360.0) - 180.0;
        let elevation = elevation.clamp(-90.0, 90.0);
        (
            (azimuth / GRID_STEP_DEG).round() as i32,
            (elevation / GRID_STEP_DEG).round() as i32,
        )
    }

    /// Look up the HRIR for a direction.
    ///
    /// Rounds to the nearest grid point; if that entry is missing, falls
    /// back to (0, 0). Returns `None` only when that is missing too.
    pub fn lookup(&self, azimuth: f32, elevation: f32) -> Option<&HrirPair> {
        self.hrirs
            .get(&Self::grid_key(azimuth, elevation))
            .or_else(|| self.hrirs.get(&(0, 0)))
    }

    /// Spatialize a mono buffer into a binaural pair.
    ///
    /// Direct time-domain convolution with each ear's impulse response,
    /// truncated to the input length. A direction with no table entry (and
    /// no (0,0) fallback) yields two silent buffers rather than an error.
    pub fn spatialize(
        &self,
        mono: &[Sample],
        azimuth: f32,
        elevation: f32,
        left: &mut [Sample],
        right: &mut [Sample],
    ) -> SpatialResult<()> {
        if left.len() != mono.len() || right.len() != mono.len() {
            return Err(SpatialError::BufferSizeMismatch {
                expected: mono.len(),
                got: left.len().min(right.len()),
            });
        }

        left.fill(0.0);
        right.fill(0.0);

        if let Some(pair) = self.lookup(azimuth, elevation) {
            convolve_into(mono, &pair.left, left);
            convolve_into(mono, &pair.right, right);
        }
        Ok(())
    }

    /// Synthesize one grid entry from the head model.
    fn synthesize_hrir(&self, azimuth: f32, elevation: f32) -> HrirPair {
        let az_rad = azimuth.to_radians();

        // ITD: positive means the sound reaches the right ear first.
        let itd_samples = (HEAD_RADIUS_M / SPEED_OF_SOUND_MS) * az_rad.sin() * self.sample_rate;
        let left_delay = itd_samples.max(0.0);
        let right_delay = (-itd_samples).max(0.0);

        // ILD: cosine level difference, equal at the median plane.
        let left_gain = 0.5 + 0.5 * (az_rad + std::f32::consts::FRAC_PI_2).cos();
        let right_gain = 0.5 + 0.5 * (az_rad - std::f32::consts::FRAC_PI_2).cos();

        let mut left = vec![0.0_f32; FILTER_LEN];
        let mut right = vec![0.0_f32; FILTER_LEN];
        left[(left_delay.round() as usize).min(FILTER_LEN - 1)] = left_gain;
        right[(right_delay.round() as usize).min(FILTER_LEN - 1)] = right_gain;

        // Far ear sits in the head shadow.
        let shadow = az_rad.sin().abs();
        self.shape_spectrum(&mut left, elevation, if azimuth > 0.0 { shadow } else { 0.0 });
        self.shape_spectrum(&mut right, elevation, if azimuth < 0.0 { shadow } else { 0.0 });

        HrirPair {
            left,
            right,
            itd_samples,
        }
    }

    /// Apply the frequency-dependent envelope to one ear's impulse:
    /// head-shadow attenuation above 2 kHz and an elevation-dependent
    /// pinna boost/cut between 7 and 12 kHz.
    fn shape_spectrum(&self, impulse: &mut [Sample], elevation: f32, shadow: f32) {
        let len = impulse.len();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(len);
        let ifft = planner.plan_fft_inverse(len);

        let mut spectrum: Vec<Complex32> =
            impulse.iter().map(|&s| Complex32::new(s, 0.0)).collect();
        fft.process(&mut spectrum);

        let nyquist = self.sample_rate * 0.5;
        for (k, bin) in spectrum.iter_mut().enumerate() {
            // Fold so the envelope stays conjugate-symmetric.
            let folded = k.min(len - k) as f32;
            let freq = folded * self.sample_rate / len as f32;

            let mut envelope = 1.0;

            if shadow > 0.0 && freq > 2000.0 && nyquist > 2000.0 {
                let ramp = ((freq - 2000.0) / (nyquist - 2000.0)).clamp(0.0, 1.0);
                envelope *= 1.0 - 0.7 * shadow * ramp;
            }

            if (7000.0..=12_000.0).contains(&freq) {
                let t = (freq - 7000.0) / 5000.0;
                let window = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos());
                envelope *= 1.0 + 0.4 * (elevation / 90.0) * window;
            }

            *bin *= envelope;
        }

        ifft.process(&mut spectrum);
        let norm = 1.0 / len as f32;
        for (s, bin) in impulse.iter_mut().zip(&spectrum) {
            *s = bin.re * norm;
        }
    }
}
