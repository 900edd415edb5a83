//! Scene model: listener, sources, room
//!
//! Pure data. The control plane owns and mutates these; the render path only
//! ever reads a consistent snapshot of them (see the engine crate's command
//! queue for how that is guaranteed).

use serde::{Deserialize, Serialize};

use crate::position::Position3D;

/// Distance attenuation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceModel {
    /// Linear falloff between reference and maximum distance
    #[default]
    Linear,
    /// Inverse falloff (1/distance style)
    Inverse,
    /// Exponential falloff
    Exponential,
}

impl DistanceModel {
    /// Parse a model name, falling back to linear for anything unknown.
    ///
    /// Unknown names are a policy fallback, not an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "linear" => DistanceModel::Linear,
            "inverse" => DistanceModel::Inverse,
            "exponential" => DistanceModel::Exponential,
            other => {
                log::warn!("unknown distance model {other:?}, falling back to linear");
                DistanceModel::Linear
            }
        }
    }
}

/// Directivity cone of a source
///
/// Angles are full cone apertures in degrees. Inside the inner cone the
/// source radiates at full gain; outside the outer cone at `outer_gain`;
/// in between the gain interpolates linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectivityCone {
    /// Inner cone aperture in degrees
    pub inner_angle: f32,
    /// Outer cone aperture in degrees
    pub outer_angle: f32,
    /// Gain outside the outer cone (linear, 0-1)
    pub outer_gain: f32,
}

impl Default for DirectivityCone {
    fn default() -> Self {
        // Omnidirectional
        Self {
            inner_angle: 360.0,
            outer_angle: 360.0,
            outer_gain: 0.0,
        }
    }
}

/// Audio source in the scene
///
/// `id` is assigned by the engine and stays unique for the lifetime of the
/// scene; ids are never reused even after a source is removed, so stale
/// references in in-flight renders can never alias a new source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    /// Stable identifier (never reused)
    pub id: u64,
    /// Position in the scene
    pub position: Position3D,
    /// Velocity (reserved for doppler by the surrounding engine)
    pub velocity: Position3D,
    /// Linear gain
    pub gain: f32,
    /// Directivity cone
    pub cone: DirectivityCone,
    /// Distance attenuation model
    pub distance_model: DistanceModel,
    /// Distance beyond which attenuation bottoms out
    pub max_distance: f32,
    /// Rolloff factor
    pub rolloff: f32,
    /// Distance at which attenuation is 1
    pub ref_distance: f32,
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            id: 0,
            position: Position3D::origin(),
            velocity: Position3D::origin(),
            gain: 1.0,
            cone: DirectivityCone::default(),
            distance_model: DistanceModel::Linear,
            max_distance: 10.0,
            rolloff: 1.0,
            ref_distance: 1.0,
        }
    }
}

/// Listener state
///
/// Exactly one listener exists per render context. Owned and mutated by the
/// control plane, read-only during a render call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerState {
    /// Position in the scene
    pub position: Position3D,
    /// Forward vector
    pub forward: Position3D,
    /// Up vector
    pub up: Position3D,
    /// Velocity (reserved for doppler)
    pub velocity: Position3D,
}

impl ListenerState {
    /// Transform a world position into the listener's frame
    /// (x = right, y = forward, z = up).
    pub fn to_listener_frame(&self, world: &Position3D) -> Position3D {
        let forward = self.forward.normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);

        let rel = world.sub(&self.position);
        Position3D::new(rel.dot(&right), rel.dot(&forward), rel.dot(&up))
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        Self {
            position: Position3D::origin(),
            forward: Position3D::new(0.0, 1.0, 0.0),
            up: Position3D::new(0.0, 0.0, 1.0),
            velocity: Position3D::origin(),
        }
    }
}

/// Per-band values at low/mid/high frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands3 {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl Bands3 {
    pub fn splat(value: f32) -> Self {
        Self {
            low: value,
            mid: value,
            high: value,
        }
    }
}

/// Room description
///
/// Exactly one room per scene. Replacing it invalidates the cached room
/// impulse response; regeneration happens on the control thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomModel {
    /// Box width in meters (x axis)
    pub width: f32,
    /// Box height in meters (z axis)
    pub height: f32,
    /// Box depth in meters (y axis)
    pub depth: f32,
    /// Absorption coefficients per band (0-1)
    pub absorption: Bands3,
    /// RT60 reverberation time per band in seconds
    pub rt60: Bands3,
    /// Diffusion scalar (0-1), scales the late tail
    pub diffusion: f32,
    /// Density scalar, scales the early reflection count
    pub density: f32,
    /// Enable early reflections derived from the room geometry
    pub early_reflections: bool,
}

impl RoomModel {
    /// True when the box dimensions are usable for parametric synthesis
    pub fn has_dimensions(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.depth > 0.0
    }
}

impl Default for RoomModel {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 3.0,
            depth: 12.0,
            absorption: Bands3 {
                low: 0.1,
                mid: 0.2,
                high: 0.3,
            },
            rt60: Bands3 {
                low: 1.2,
                mid: 1.0,
                high: 0.8,
            },
            diffusion: 0.7,
            density: 1.0,
            early_reflections: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_model_from_name() {
        assert_eq!(DistanceModel::from_name("inverse"), DistanceModel::Inverse);
        assert_eq!(
            DistanceModel::from_name("exponential"),
            DistanceModel::Exponential
        );
        // Unknown names fall back to linear
        assert_eq!(DistanceModel::from_name("what"), DistanceModel::Linear);
    }

    #[test]
    fn test_listener_frame_identity() {
        let listener = ListenerState::default();
        let world = Position3D::new(1.0, 2.0, 3.0);
        let local = listener.to_listener_frame(&world);
        assert!((local.x - 1.0).abs() < 1e-6);
        assert!((local.y - 2.0).abs() < 1e-6);
        assert!((local.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_listener_frame_rotated() {
        // Listener facing hard right: world-right becomes local-forward.
        let listener = ListenerState {
            forward: Position3D::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let world = Position3D::new(1.0, 0.0, 0.0);
        let local = listener.to_listener_frame(&world);
        assert!(local.x.abs() < 1e-6);
        assert!((local.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_listener_frame_translation() {
        let listener = ListenerState {
            position: Position3D::new(0.0, -1.0, 0.0),
            ..Default::default()
        };
        let local = listener.to_listener_frame(&Position3D::origin());
        assert!((local.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scene_serde_round_trip() {
        let source = AudioSource {
            id: 3,
            position: Position3D::new(0.5, -0.25, 0.0),
            distance_model: DistanceModel::Exponential,
            ..Default::default()
        };
        let json = serde_json::to_string(&source).unwrap();
        let back: AudioSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);

        let room = RoomModel::default();
        let json = serde_json::to_string(&room).unwrap();
        let back: RoomModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, room);
    }
}
