//! Ambisonic encoder - positioned mono sources to spherical-harmonic channels

use auralis_core::Sample;

use super::{AmbisonicFormat, AmbisonicOrder, SphericalHarmonics};
use crate::error::{SpatialError, SpatialResult};
use crate::metrics::SpatialMetrics;

/// Ambisonic encoder for point sources
///
/// The order is fixed per instance. Coefficients are cached per direction so
/// a stationary source costs one multiply-accumulate per channel per sample.
pub struct AmbisonicEncoder {
    order: AmbisonicOrder,
    num_channels: usize,
    cached_sh: SphericalHarmonics,
    last_direction: Option<(f32, f32)>,
}

impl AmbisonicEncoder {
    /// Create new encoder with the specified order
    pub fn new(order: AmbisonicOrder) -> Self {
        Self {
            order,
            num_channels: order.channel_count(),
            cached_sh: SphericalHarmonics::new(order),
            last_direction: None,
        }
    }

    /// Number of output channels
    pub fn channel_count(&self) -> usize {
        self.num_channels
    }

    /// Stream format metadata for this encoder's output
    pub fn format(&self) -> AmbisonicFormat {
        AmbisonicFormat::n3d_acn(self.order)
    }

    /// Encode a set of positioned mono signals, accumulating into `channels`.
    ///
    /// `channels` must hold exactly `channel_count()` buffers; each is
    /// cleared and then receives `mono[n] * coeff[c]` from every source.
    pub fn encode_into(
        &mut self,
        sources: &[(&[Sample], SpatialMetrics)],
        channels: &mut [Vec<Sample>],
    ) -> SpatialResult<()> {
        if channels.len() != self.num_channels {
            return Err(SpatialError::InvalidChannelCount {
                expected: self.num_channels,
                got: channels.len(),
            });
        }
        for channel in channels.iter_mut() {
            channel.fill(0.0);
        }

        for (mono, metrics) in sources {
            self.update_direction(metrics.azimuth, metrics.elevation);
            for (ch, channel) in channels.iter_mut().enumerate() {
                let coeff = self.cached_sh.get(ch);
                if coeff == 0.0 {
                    continue;
                }
                for (out, &sample) in channel.iter_mut().zip(mono.iter()) {
                    *out += sample * coeff;
                }
            }
        }
        Ok(())
    }

    /// Encode into freshly allocated channel buffers of `block_size` samples
    pub fn encode(
        &mut self,
        sources: &[(&[Sample], SpatialMetrics)],
        block_size: usize,
    ) -> SpatialResult<Vec<Vec<Sample>>> {
        let mut channels = vec![vec![0.0_f32; block_size]; self.num_channels];
        self.encode_into(sources, &mut channels)?;
        Ok(channels)
    }

    /// Recompute cached coefficients when the direction moved
    fn update_direction(&mut self, azimuth: f32, elevation: f32) {
        let stale = match self.last_direction {
            None => true,
            Some((az, el)) => (az - azimuth).abs() > 1e-6 || (el - elevation).abs() > 1e-6,
        };
        if stale {
            self.cached_sh.compute_for_direction(azimuth, elevation);
            self.last_direction = Some((azimuth, elevation));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const W_COEFF: f32 = 0.282_094_8;

    fn metrics_at(azimuth: f32, elevation: f32) -> SpatialMetrics {
        SpatialMetrics {
            azimuth,
            elevation,
            distance: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_encoder_channel_counts() {
        assert_eq!(AmbisonicEncoder::new(AmbisonicOrder::First).channel_count(), 4);
        assert_eq!(AmbisonicEncoder::new(AmbisonicOrder::Third).channel_count(), 16);
    }

    #[test]
    fn test_w_channel_is_scaled_downmix() {
        // W equals the mono signal times 1/sqrt(4 pi), wherever the source is.
        let mono: Vec<Sample> = (0..128).map(|i| (i as f32 * 0.17).sin()).collect();

        for (az, el) in [(0.0, 0.0), (90.0, 0.0), (-45.0, 60.0)] {
            let mut encoder = AmbisonicEncoder::new(AmbisonicOrder::Third);
            let channels = encoder
                .encode(&[(&mono, metrics_at(az, el))], mono.len())
                .unwrap();
            for (w, &m) in channels[0].iter().zip(&mono) {
                assert_relative_eq!(*w, m * W_COEFF, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_block_size_invariant() {
        let mono = vec![0.5_f32; 512];
        let mut encoder = AmbisonicEncoder::new(AmbisonicOrder::Third);
        let channels = encoder.encode(&[(&mono, metrics_at(30.0, 10.0))], 512).unwrap();
        assert_eq!(channels.len(), 16);
        for ch in &channels {
            assert_eq!(ch.len(), 512);
        }
    }

    #[test]
    fn test_sources_accumulate() {
        let mono = vec![1.0_f32; 16];
        let mut encoder = AmbisonicEncoder::new(AmbisonicOrder::First);

        let one = encoder.encode(&[(&mono, metrics_at(0.0, 0.0))], 16).unwrap();
        let two = encoder
            .encode(&[
                (&mono, metrics_at(0.0, 0.0)),
                (&mono, metrics_at(0.0, 0.0)),
            ], 16)
            .unwrap();
        assert_relative_eq!(two[0][0], one[0][0] * 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_left_source_has_negative_y() {
        let mono = vec![1.0_f32; 8];
        let mut encoder = AmbisonicEncoder::new(AmbisonicOrder::First);
        let channels = encoder.encode(&[(&mono, metrics_at(-90.0, 0.0))], 8).unwrap();
        assert!(channels[1][0] < -0.4);
        assert!(channels[3][0].abs() < 1e-5);
    }

    #[test]
    fn test_channel_count_mismatch_is_error() {
        let mono = vec![0.0_f32; 8];
        let mut encoder = AmbisonicEncoder::new(AmbisonicOrder::First);
        let mut wrong = vec![vec![0.0_f32; 8]; 3];
        assert!(encoder
            .encode_into(&[(&mono, metrics_at(0.0, 0.0))], &mut wrong)
            .is_err());
    }
}
