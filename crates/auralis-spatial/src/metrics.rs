//! Per-source spatial metrics
//!
//! Derived from source and listener state on every render call; never
//! stored. Downstream stages key off azimuth/elevation/distance, the
//! perceptual scores feed the surrounding application's visualization.

use serde::{Deserialize, Serialize};

use crate::scene::{AudioSource, ListenerState};

/// Spatial metrics for one source relative to the listener
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialMetrics {
    /// Azimuth in degrees (-180 to 180, positive = right)
    pub azimuth: f32,
    /// Elevation in degrees (-90 to 90, positive = up)
    pub elevation: f32,
    /// Distance from the listener
    pub distance: f32,
    /// How far the image sits toward one ear (0 = center, 1 = hard side)
    pub lateralization: f32,
    /// How far outside the head the image sits (0-1)
    pub externalization: f32,
    /// How much the source wraps around the listener (0-1)
    pub envelopment: f32,
}

impl SpatialMetrics {
    /// Compute metrics for `source` as heard by `listener`
    pub fn compute(source: &AudioSource, listener: &ListenerState) -> Self {
        let rel = listener.to_listener_frame(&source.position);
        let distance = rel.magnitude();
        let azimuth = rel.x.atan2(rel.y).to_degrees();
        let elevation = rel.z.atan2(rel.x.hypot(rel.y)).to_degrees();

        let lateralization = azimuth.to_radians().sin().abs();
        let externalization = 0.2 + 0.8 * distance / (distance + 1.0);

        // Wider cones and larger reach both read as more enveloping.
        let distance_term = (source.max_distance / 10.0).min(0.4);
        let cone_term = ((180.0 - source.cone.outer_angle) / 180.0).max(0.0) * 0.3;
        let envelopment = (0.3 + distance_term + cone_term).clamp(0.0, 1.0);

        Self {
            azimuth,
            elevation,
            distance,
            lateralization,
            externalization,
            envelopment,
        }
    }
}

impl Default for SpatialMetrics {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            distance: 0.0,
            lateralization: 0.0,
            externalization: 0.2,
            envelopment: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position3D;

    #[test]
    fn test_hard_right_azimuth() {
        let source = AudioSource {
            position: Position3D::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let metrics = SpatialMetrics::compute(&source, &ListenerState::default());
        assert!((metrics.azimuth - 90.0).abs() < 0.01);
        assert!((metrics.lateralization - 1.0).abs() < 0.001);
        assert!((metrics.distance - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_front_is_centered() {
        let source = AudioSource {
            position: Position3D::new(0.0, 1.0, 0.0),
            ..Default::default()
        };
        let metrics = SpatialMetrics::compute(&source, &ListenerState::default());
        assert!(metrics.azimuth.abs() < 0.01);
        assert!(metrics.lateralization < 0.001);
    }

    #[test]
    fn test_externalization_grows_with_distance() {
        let near = AudioSource {
            position: Position3D::new(0.0, 0.5, 0.0),
            ..Default::default()
        };
        let far = AudioSource {
            position: Position3D::new(0.0, 5.0, 0.0),
            ..Default::default()
        };
        let listener = ListenerState::default();
        let m_near = SpatialMetrics::compute(&near, &listener);
        let m_far = SpatialMetrics::compute(&far, &listener);
        assert!(m_far.externalization > m_near.externalization);
        assert!(m_far.externalization < 1.0);
    }

    #[test]
    fn test_envelopment_range() {
        // Default source: max_distance 10, omni cone.
        let metrics =
            SpatialMetrics::compute(&AudioSource::default(), &ListenerState::default());
        assert!((metrics.envelopment - 0.7).abs() < 0.001);

        // Narrow cone adds its term.
        let narrow = AudioSource {
            cone: crate::scene::DirectivityCone {
                inner_angle: 30.0,
                outer_angle: 90.0,
                outer_gain: 0.1,
            },
            ..Default::default()
        };
        let metrics = SpatialMetrics::compute(&narrow, &ListenerState::default());
        assert!(metrics.envelopment <= 1.0);
        assert!(metrics.envelopment > 0.7);
    }
}
