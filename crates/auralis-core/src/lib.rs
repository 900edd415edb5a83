//! auralis-core: Shared types, traits, and utilities for Auralis
//!
//! This crate provides the foundational types used across all Auralis crates.

mod error;
mod sample;

pub use error::*;
pub use sample::*;

/// Standard sample rate options
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum SampleRate {
    Hz44100 = 44100,
    Hz48000 = 48000,
    Hz88200 = 88200,
    Hz96000 = 96000,
}

impl SampleRate {
    #[inline]
    pub fn as_f32(self) -> f32 {
        self as u32 as f32
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}

/// Render block size options
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum BlockSize {
    Samples128 = 128,
    Samples256 = 256,
    Samples512 = 512,
    Samples1024 = 1024,
    Samples2048 = 2048,
}

impl BlockSize {
    #[inline]
    pub fn as_usize(self) -> usize {
        self as u32 as usize
    }

    /// Block duration in milliseconds at the given sample rate
    #[inline]
    pub fn duration_ms(self, sample_rate: SampleRate) -> f32 {
        (self.as_usize() as f32 / sample_rate.as_f32()) * 1000.0
    }

    /// Block duration as a [`std::time::Duration`] (the render deadline)
    #[inline]
    pub fn deadline(self, sample_rate: SampleRate) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.as_usize() as f64 / sample_rate.as_u32() as f64)
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::Samples512
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_conversions() {
        assert_eq!(SampleRate::Hz44100.as_u32(), 44100);
        assert_eq!(SampleRate::default().as_u32(), 48000);
    }

    #[test]
    fn test_block_duration() {
        let ms = BlockSize::Samples512.duration_ms(SampleRate::Hz48000);
        assert!((ms - 10.666).abs() < 0.01);

        let deadline = BlockSize::Samples512.deadline(SampleRate::Hz48000);
        assert!(deadline.as_micros() > 10_000 && deadline.as_micros() < 11_000);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&SampleRate::Hz44100).unwrap();
        let back: SampleRate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SampleRate::Hz44100);
    }
}
