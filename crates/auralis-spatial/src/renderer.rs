//! Format renderer: per-source spatial results to the delivery format
//!
//! Terminal stage of the render chain. Takes each source's binaural pair
//! (plus its metrics) and produces the requested output layout:
//! - stereo: plain sum, interleaved
//! - binaural: per-source crossfeed, then sum, interleaved
//! - ambisonics: mono downmix per source through the HOA encoder
//! - 5.1 / 7.1: cosine panning against the fixed speaker angle tables

use serde::{Deserialize, Serialize};

use auralis_core::Sample;

use crate::binaural::Crossfeed;
use crate::error::{SpatialError, SpatialResult};
use crate::hoa::{AmbisonicEncoder, AmbisonicFormat, AmbisonicOrder};
use crate::metrics::SpatialMetrics;
use crate::SpeakerLayout;

/// Requested delivery format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Interleaved stereo downmix
    #[default]
    Stereo,
    /// Interleaved stereo with crossfeed for headphones
    Binaural,
    /// Spherical-harmonic channel set (ACN/N3D)
    Ambisonics,
    /// 5.1 surround channel set
    Surround51,
    /// 7.1 surround channel set
    Surround71,
}

/// One source's spatialized result entering the renderer
pub struct SourceFeed<'a> {
    /// Metrics computed by the attenuation stage
    pub metrics: SpatialMetrics,
    /// Left binaural channel
    pub left: &'a [Sample],
    /// Right binaural channel
    pub right: &'a [Sample],
}

/// Mixed channel set before interleaving, still open for bus processing
pub struct MixedBlock {
    /// One buffer per output channel
    pub channels: Vec<Vec<Sample>>,
    kind: MixKind,
}

enum MixKind {
    Stereo,
    Ambisonic(AmbisonicFormat),
    Surround(SpeakerLayout),
}

impl MixedBlock {
    /// Finish the block: stereo kinds interleave, channel sets pass through.
    pub fn finalize(self) -> OutputBlock {
        match self.kind {
            MixKind::Stereo => {
                let [left, right]: [Vec<Sample>; 2] = self
                    .channels
                    .try_into()
                    .expect("stereo mix always carries two channels");
                let mut interleaved = Vec::with_capacity(left.len() * 2);
                for (l, r) in left.iter().zip(right.iter()) {
                    interleaved.push(*l);
                    interleaved.push(*r);
                }
                OutputBlock::Stereo { interleaved }
            }
            MixKind::Ambisonic(format) => OutputBlock::Ambisonic {
                channels: self.channels,
                format,
            },
            MixKind::Surround(layout) => OutputBlock::Surround {
                channels: self.channels,
                layout,
            },
        }
    }
}

/// Rendered output block, tagged with its format metadata
#[derive(Debug, Clone)]
pub enum OutputBlock {
    /// Interleaved stereo (L/R alternating)
    Stereo { interleaved: Vec<Sample> },
    /// Ambisonic channel set with stream description
    Ambisonic {
        channels: Vec<Vec<Sample>>,
        format: AmbisonicFormat,
    },
    /// Surround channel set with speaker layout
    Surround {
        channels: Vec<Vec<Sample>>,
        layout: SpeakerLayout,
    },
}

impl OutputBlock {
    /// Number of output channels
    pub fn channel_count(&self) -> usize {
        match self {
            OutputBlock::Stereo { .. } => 2,
            OutputBlock::Ambisonic { channels, .. } => channels.len(),
            OutputBlock::Surround { channels, .. } => channels.len(),
        }
    }

    /// Samples per channel
    pub fn samples_per_channel(&self) -> usize {
        match self {
            OutputBlock::Stereo { interleaved } => interleaved.len() / 2,
            OutputBlock::Ambisonic { channels, .. } => {
                channels.first().map_or(0, |ch| ch.len())
            }
            OutputBlock::Surround { channels, .. } => {
                channels.first().map_or(0, |ch| ch.len())
            }
        }
    }
}

/// Per-speaker panning gains for a source azimuth: `max(0, cos(az - angle))`
/// per speaker, normalized to sum to 1 when any speaker is lit.
pub fn surround_gains(layout: &SpeakerLayout, azimuth: f32) -> Vec<f32> {
    let mut gains: Vec<f32> = layout
        .speakers
        .iter()
        .map(|spk| (azimuth - spk.angle_deg).to_radians().cos().max(0.0))
        .collect();

    let sum: f32 = gains.iter().sum();
    if sum > 0.0 {
        for g in &mut gains {
            *g /= sum;
        }
    }
    gains
}

/// Format renderer
pub struct FormatRenderer {
    block_size: usize,
    crossfeed: Crossfeed,
    encoder: AmbisonicEncoder,
}

impl FormatRenderer {
    /// Create a renderer for fixed-size blocks with the given ambisonic order
    pub fn new(block_size: usize, order: AmbisonicOrder) -> SpatialResult<Self> {
        if block_size == 0 {
            return Err(SpatialError::InvalidBlockSize(block_size));
        }
        Ok(Self {
            block_size,
            crossfeed: Crossfeed::default(),
            encoder: AmbisonicEncoder::new(order),
        })
    }

    /// Configured block size
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Render per-source results into the requested format
    pub fn render(
        &mut self,
        feeds: &[SourceFeed<'_>],
        format: OutputFormat,
    ) -> SpatialResult<OutputBlock> {
        Ok(self.mix(feeds, format)?.finalize())
    }

    /// Mix per-source results into channel buffers, leaving interleaving to
    /// [`MixedBlock::finalize`] so a reverb bus can still run in between.
    pub fn mix(
        &mut self,
        feeds: &[SourceFeed<'_>],
        format: OutputFormat,
    ) -> SpatialResult<MixedBlock> {
        for feed in feeds {
            if feed.left.len() != self.block_size || feed.right.len() != self.block_size {
                return Err(SpatialError::BufferSizeMismatch {
                    expected: self.block_size,
                    got: feed.left.len().min(feed.right.len()),
                });
            }
        }

        match format {
            OutputFormat::Stereo => Ok(self.mix_stereo(feeds, false)),
            OutputFormat::Binaural => Ok(self.mix_stereo(feeds, true)),
            OutputFormat::Ambisonics => self.mix_ambisonic(feeds),
            OutputFormat::Surround51 => Ok(self.mix_surround(feeds, SpeakerLayout::surround_5_1())),
            OutputFormat::Surround71 => Ok(self.mix_surround(feeds, SpeakerLayout::surround_7_1())),
        }
    }

    /// Encode positioned mono signals directly (the ambisonics fast path,
    /// which skips HRTF and room processing entirely).
    pub fn encode_ambisonics(
        &mut self,
        sources: &[(&[Sample], SpatialMetrics)],
    ) -> SpatialResult<OutputBlock> {
        let channels = self.encoder.encode(sources, self.block_size)?;
        Ok(OutputBlock::Ambisonic {
            channels,
            format: self.encoder.format(),
        })
    }

    fn mix_stereo(&self, feeds: &[SourceFeed<'_>], crossfeed: bool) -> MixedBlock {
        let mut left = vec![0.0_f32; self.block_size];
        let mut right = vec![0.0_f32; self.block_size];
        let k = if crossfeed { self.crossfeed.amount() } else { 0.0 };

        for feed in feeds {
            for n in 0..self.block_size {
                let (l, r) = (feed.left[n], feed.right[n]);
                left[n] += l + r * k;
                right[n] += r + l * k;
            }
        }

        MixedBlock {
            channels: vec![left, right],
            kind: MixKind::Stereo,
        }
    }

    fn mix_ambisonic(&mut self, feeds: &[SourceFeed<'_>]) -> SpatialResult<MixedBlock> {
        // Downmix each source's binaural pair before encoding.
        let monos: Vec<Vec<Sample>> = feeds
            .iter()
            .map(|feed| {
                feed.left
                    .iter()
                    .zip(feed.right.iter())
                    .map(|(&l, &r)| (l + r) * 0.5)
                    .collect()
            })
            .collect();
        let sources: Vec<(&[Sample], SpatialMetrics)> = monos
            .iter()
            .zip(feeds.iter())
            .map(|(mono, feed)| (mono.as_slice(), feed.metrics))
            .collect();

        let channels = self.encoder.encode(&sources, self.block_size)?;
        Ok(MixedBlock {
            channels,
            kind: MixKind::Ambisonic(self.encoder.format()),
        })
    }

    fn mix_surround(&self, feeds: &[SourceFeed<'_>], layout: SpeakerLayout) -> MixedBlock {
        let mut channels = vec![vec![0.0_f32; self.block_size]; layout.total_channels()];

        for feed in feeds {
            let gains = surround_gains(&layout, feed.metrics.azimuth);
            for (speaker, &gain) in layout.speakers.iter().zip(&gains) {
                if gain <= 0.0 {
                    continue;
                }
                let channel = &mut channels[speaker.channel];
                for n in 0..self.block_size {
                    channel[n] += 0.5 * (feed.left[n] + feed.right[n]) * gain;
                }
            }
        }

        MixedBlock {
            channels,
            kind: MixKind::Surround(layout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feed_at<'a>(azimuth: f32, left: &'a [Sample], right: &'a [Sample]) -> SourceFeed<'a> {
        SourceFeed {
            metrics: SpatialMetrics {
                azimuth,
                ..Default::default()
            },
            left,
            right,
        }
    }

    #[test]
    fn test_stereo_sums_and_interleaves() {
        let mut renderer = FormatRenderer::new(4, AmbisonicOrder::First).unwrap();
        let a_l = vec![0.5_f32; 4];
        let a_r = vec![0.25_f32; 4];
        let b_l = vec![0.1_f32; 4];
        let b_r = vec![0.2_f32; 4];

        let out = renderer
            .render(
                &[feed_at(0.0, &a_l, &a_r), feed_at(0.0, &b_l, &b_r)],
                OutputFormat::Stereo,
            )
            .unwrap();

        match out {
            OutputBlock::Stereo { interleaved } => {
                assert_eq!(interleaved.len(), 8);
                assert_relative_eq!(interleaved[0], 0.6, epsilon = 1e-6);
                assert_relative_eq!(interleaved[1], 0.45, epsilon = 1e-6);
            }
            _ => panic!("expected stereo output"),
        }
    }

    #[test]
    fn test_binaural_applies_crossfeed_per_source() {
        let mut renderer = FormatRenderer::new(2, AmbisonicOrder::First).unwrap();
        let left = vec![1.0_f32; 2];
        let right = vec![0.0_f32; 2];

        let out = renderer
            .render(&[feed_at(-90.0, &left, &right)], OutputFormat::Binaural)
            .unwrap();
        match out {
            OutputBlock::Stereo { interleaved } => {
                assert_relative_eq!(interleaved[0], 1.0, epsilon = 1e-6);
                assert_relative_eq!(interleaved[1], 0.3, epsilon = 1e-6);
            }
            _ => panic!("expected stereo output"),
        }
    }

    #[test]
    fn test_surround_gains_normalized() {
        for layout in [SpeakerLayout::surround_5_1(), SpeakerLayout::surround_7_1()] {
            for az in [-180.0_f32, -97.0, -30.0, 0.0, 12.5, 90.0, 151.0] {
                let gains = surround_gains(&layout, az);
                assert!(gains.iter().all(|&g| g >= 0.0));
                let sum: f32 = gains.iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_surround_front_left_favors_l() {
        let layout = SpeakerLayout::surround_5_1();
        let gains = surround_gains(&layout, -30.0);
        let l_gain = gains[0];
        for (i, &g) in gains.iter().enumerate() {
            assert!(g <= l_gain + 1e-6, "speaker {i} louder than L for az -30");
        }
    }

    #[test]
    fn test_surround_mix_energy_placement() {
        let mut renderer = FormatRenderer::new(8, AmbisonicOrder::First).unwrap();
        let left = vec![1.0_f32; 8];
        let right = vec![1.0_f32; 8];

        let out = renderer
            .render(&[feed_at(110.0, &left, &right)], OutputFormat::Surround51)
            .unwrap();
        match out {
            OutputBlock::Surround { channels, layout } => {
                assert_eq!(layout.total_channels(), 6);
                // Rs (channel 5) should carry the most energy at azimuth 110.
                let energies: Vec<f32> =
                    channels.iter().map(|ch| auralis_core::rms(ch)).collect();
                let max = energies
                    .iter()
                    .cloned()
                    .fold(f32::NEG_INFINITY, f32::max);
                assert_relative_eq!(energies[5], max, epsilon = 1e-6);
            }
            _ => panic!("expected surround output"),
        }
    }

    #[test]
    fn test_ambisonic_delegation() {
        let mut renderer = FormatRenderer::new(16, AmbisonicOrder::Third).unwrap();
        let left = vec![0.8_f32; 16];
        let right = vec![0.4_f32; 16];

        let out = renderer
            .render(&[feed_at(0.0, &left, &right)], OutputFormat::Ambisonics)
            .unwrap();
        match out {
            OutputBlock::Ambisonic { channels, format } => {
                assert_eq!(channels.len(), 16);
                assert_eq!(format.order, AmbisonicOrder::Third);
                // W = downmix * 1/sqrt(4 pi)
                assert_relative_eq!(channels[0][0], 0.6 * 0.282_094_8, epsilon = 1e-5);
            }
            _ => panic!("expected ambisonic output"),
        }
    }

    #[test]
    fn test_block_size_invariant_all_formats() {
        let mut renderer = FormatRenderer::new(32, AmbisonicOrder::Second).unwrap();
        let left = vec![0.1_f32; 32];
        let right = vec![0.1_f32; 32];

        for format in [
            OutputFormat::Stereo,
            OutputFormat::Binaural,
            OutputFormat::Ambisonics,
            OutputFormat::Surround51,
            OutputFormat::Surround71,
        ] {
            let feeds = [feed_at(45.0, &left, &right)];
            let out = renderer.render(&feeds, format).unwrap();
            assert_eq!(out.samples_per_channel(), 32, "{format:?}");
        }
    }

    #[test]
    fn test_empty_scene_is_silent() {
        let mut renderer = FormatRenderer::new(8, AmbisonicOrder::First).unwrap();
        let out = renderer.render(&[], OutputFormat::Stereo).unwrap();
        match out {
            OutputBlock::Stereo { interleaved } => {
                assert!(interleaved.iter().all(|&s| s == 0.0));
            }
            _ => panic!("expected stereo output"),
        }
    }

    #[test]
    fn test_mismatched_feed_is_error() {
        let mut renderer = FormatRenderer::new(16, AmbisonicOrder::First).unwrap();
        let left = vec![0.0_f32; 8];
        let right = vec![0.0_f32; 16];
        assert!(renderer
            .render(&[feed_at(0.0, &left, &right)], OutputFormat::Stereo)
            .is_err());
    }
}
