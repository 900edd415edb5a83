//! Attenuation and directivity stage
//!
//! First stage of the render chain: converts a raw source buffer into a
//! gain-shaped buffer using distance and cone-directivity models, and derives
//! the [`SpatialMetrics`] consumed by every later stage.

use auralis_core::Sample;

use crate::metrics::SpatialMetrics;
use crate::scene::{AudioSource, DistanceModel, ListenerState};

/// Attenuation and directivity stage
///
/// Stateless; one instance serves every source.
#[derive(Debug, Default)]
pub struct AttenuationStage;

impl AttenuationStage {
    pub fn new() -> Self {
        Self
    }

    /// Gain-shape `buffer` in place and return the metrics for this source.
    ///
    /// The buffer keeps its length; every sample is multiplied by
    /// `source.gain * clamp(attenuation, 0, 1) * directivity`.
    pub fn shape(
        &self,
        buffer: &mut [Sample],
        source: &AudioSource,
        listener: &ListenerState,
    ) -> SpatialMetrics {
        let metrics = SpatialMetrics::compute(source, listener);

        let attenuation = distance_attenuation(
            source.distance_model,
            metrics.distance,
            source.ref_distance,
            source.max_distance,
            source.rolloff,
        );
        let directivity = cone_gain(source, metrics.azimuth);
        let gain = source.gain * attenuation.clamp(0.0, 1.0) * directivity;

        for sample in buffer.iter_mut() {
            *sample *= gain;
        }

        metrics
    }
}

/// Distance attenuation per the selected model, before the final [0,1] clamp.
///
/// Degenerate configuration (non-positive reference distance, maximum not
/// beyond reference) substitutes a safe unit gain rather than erroring.
pub fn distance_attenuation(
    model: DistanceModel,
    distance: f32,
    ref_distance: f32,
    max_distance: f32,
    rolloff: f32,
) -> f32 {
    let ref_distance = if ref_distance > 0.0 {
        ref_distance
    } else {
        log::warn!("non-positive reference distance {ref_distance}, substituting 1.0");
        1.0
    };

    match model {
        DistanceModel::Linear => {
            let span = max_distance - ref_distance;
            if span <= f32::EPSILON {
                log::warn!(
                    "degenerate distance range (ref {ref_distance}, max {max_distance}), \
                     substituting unit gain"
                );
                return 1.0;
            }
            (1.0 - rolloff * (distance - ref_distance) / span).clamp(0.0, 1.0)
        }
        DistanceModel::Inverse => {
            let denom = ref_distance + rolloff * (distance - ref_distance);
            if denom <= f32::EPSILON {
                return 1.0;
            }
            ref_distance / denom
        }
        DistanceModel::Exponential => {
            if distance <= 0.0 {
                return 1.0;
            }
            (distance / ref_distance).powf(-rolloff)
        }
    }
}

/// Cone directivity multiplier for a source at the given azimuth.
///
/// The source is assumed to face the listener, so the off-axis angle is the
/// azimuth magnitude. This reproduces the original engine's simplification;
/// there is no independent source-orientation vector.
pub fn cone_gain(source: &AudioSource, azimuth: f32) -> f32 {
    let off_axis = azimuth.abs();
    let half_inner = source.cone.inner_angle * 0.5;
    let half_outer = source.cone.outer_angle * 0.5;

    if off_axis <= half_inner || half_outer <= half_inner {
        1.0
    } else if off_axis >= half_outer {
        source.cone.outer_gain
    } else {
        let t = (off_axis - half_inner) / (half_outer - half_inner);
        1.0 + (source.cone.outer_gain - 1.0) * t
    }
}
