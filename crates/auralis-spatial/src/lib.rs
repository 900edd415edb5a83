//! Auralis Spatial Audio Engine
//!
//! Per-block 3D spatialization of positioned sources:
//!
//! ## Attenuation & Directivity
//! - Linear / inverse / exponential distance models
//! - Cone directivity with inner/outer interpolation
//! - Per-source spatial metrics (azimuth, elevation, perceptual scores)
//!
//! ## Binaural Processing
//! - Directionally-indexed HRTF table (15 degree grid)
//! - Synthetic ITD/ILD generation with head-shadow and pinna shaping
//! - Direct time-domain HRIR convolution
//! - Crossfeed for externalization
//!
//! ## Room Acoustics
//! - Parametric impulse synthesis from box geometry
//! - Seeded stochastic early reflections and RT60-derived late tail
//! - Streaming convolution reverb at a fixed wet gain
//!
//! ## Higher-Order Ambisonics (HOA)
//! - Up to 7th order (64 channels)
//! - ACN channel ordering, N3D normalization
//!
//! ## Format Rendering
//! - Stereo, binaural, ambisonics, 5.1 / 7.1 surround
//! - Cosine amplitude panning against fixed speaker layouts

pub mod attenuation;
pub mod binaural;
pub mod hoa;
pub mod renderer;
pub mod room;

mod error;
mod metrics;
mod position;
mod scene;

pub use attenuation::{cone_gain, distance_attenuation, AttenuationStage};
pub use binaural::{Crossfeed, HrirPair, HrtfTable};
pub use error::{SpatialError, SpatialResult};
pub use hoa::{AmbisonicEncoder, AmbisonicFormat, AmbisonicOrder};
pub use metrics::SpatialMetrics;
pub use position::{Position3D, SphericalCoord};
pub use renderer::{FormatRenderer, OutputBlock, OutputFormat, SourceFeed};
pub use room::{RoomEngine, RoomIr};
pub use scene::{
    AudioSource, Bands3, DirectivityCone, DistanceModel, ListenerState, RoomModel,
};

use serde::{Deserialize, Serialize};

/// Speaker layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerLayout {
    /// Layout name
    pub name: String,
    /// Speaker definitions
    pub speakers: Vec<Speaker>,
    /// Has LFE channel
    pub has_lfe: bool,
}

/// Single speaker definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Speaker label (e.g., "L", "R", "C", "Ls")
    pub label: String,
    /// Horizontal angle in degrees (0 = front, positive = right)
    pub angle_deg: f32,
    /// Channel index
    pub channel: usize,
    /// Is this a subwoofer/LFE
    pub is_lfe: bool,
}

impl SpeakerLayout {
    /// Stereo (2.0)
    pub fn stereo() -> Self {
        Self {
            name: "Stereo".into(),
            speakers: vec![Speaker::new("L", -30.0, 0), Speaker::new("R", 30.0, 1)],
            has_lfe: false,
        }
    }

    /// 5.1 Surround
    pub fn surround_5_1() -> Self {
        Self {
            name: "5.1".into(),
            speakers: vec![
                Speaker::new("L", -30.0, 0),
                Speaker::new("R", 30.0, 1),
                Speaker::new("C", 0.0, 2),
                Speaker::new_lfe("LFE", 3),
                Speaker::new("Ls", -110.0, 4),
                Speaker::new("Rs", 110.0, 5),
            ],
            has_lfe: true,
        }
    }

    /// 7.1 Surround (sides at +/-90, backs at +/-150)
    pub fn surround_7_1() -> Self {
        Self {
            name: "7.1".into(),
            speakers: vec![
                Speaker::new("L", -30.0, 0),
                Speaker::new("R", 30.0, 1),
                Speaker::new("C", 0.0, 2),
                Speaker::new_lfe("LFE", 3),
                Speaker::new("Ls", -90.0, 4),
                Speaker::new("Rs", 90.0, 5),
                Speaker::new("Lb", -150.0, 6),
                Speaker::new("Rb", 150.0, 7),
            ],
            has_lfe: true,
        }
    }

    /// Get number of channels (excluding LFE)
    pub fn channel_count(&self) -> usize {
        self.speakers.iter().filter(|s| !s.is_lfe).count()
    }

    /// Get total channel count (including LFE)
    pub fn total_channels(&self) -> usize {
        self.speakers.len()
    }
}

impl Speaker {
    /// Create new speaker
    pub fn new(label: &str, angle_deg: f32, channel: usize) -> Self {
        Self {
            label: label.to_string(),
            angle_deg,
            channel,
            is_lfe: false,
        }
    }

    /// Create LFE speaker (angle 0)
    pub fn new_lfe(label: &str, channel: usize) -> Self {
        Self {
            label: label.to_string(),
            angle_deg: 0.0,
            channel,
            is_lfe: true,
        }
    }
}
