//! 3D position types and spherical conversions

use serde::{Deserialize, Serialize};

/// 3D position in space
///
/// Coordinates are nominally in [-1, 1] per axis but nothing enforces the
/// range; callers exceed it to represent distant sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    /// X coordinate (left/right, positive = right)
    pub x: f32,
    /// Y coordinate (back/front, positive = front)
    pub y: f32,
    /// Z coordinate (down/up, positive = up)
    pub z: f32,
}

impl Position3D {
    /// Create new position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin position
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Create from spherical coordinates
    ///
    /// # Arguments
    /// * `azimuth` - Horizontal angle in degrees (-180 to 180, 0 = front, positive = right)
    /// * `elevation` - Vertical angle in degrees (-90 to 90, positive = up)
    /// * `distance` - Distance from origin
    pub fn from_spherical(azimuth: f32, elevation: f32, distance: f32) -> Self {
        let az_rad = azimuth.to_radians();
        let el_rad = elevation.to_radians();

        let cos_el = el_rad.cos();

        Self {
            x: distance * az_rad.sin() * cos_el,
            y: distance * az_rad.cos() * cos_el,
            z: distance * el_rad.sin(),
        }
    }

    /// Convert to spherical coordinates
    pub fn to_spherical(&self) -> SphericalCoord {
        let distance = self.magnitude();
        if distance < 1e-10 {
            return SphericalCoord {
                azimuth: 0.0,
                elevation: 0.0,
                distance: 0.0,
            };
        }

        let azimuth = self.x.atan2(self.y).to_degrees();
        let elevation = self.z.atan2(self.x.hypot(self.y)).to_degrees();

        SphericalCoord {
            azimuth,
            elevation,
            distance,
        }
    }

    /// Get magnitude (distance from origin)
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit vector
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag < 1e-10 {
            return Self::new(0.0, 1.0, 0.0); // Default forward
        }
        Self::new(self.x / mag, self.y / mag, self.z / mag)
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise subtraction
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Default for Position3D {
    fn default() -> Self {
        Self::origin()
    }
}

/// Spherical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalCoord {
    /// Azimuth in degrees (-180 to 180)
    pub azimuth: f32,
    /// Elevation in degrees (-90 to 90)
    pub elevation: f32,
    /// Distance from origin
    pub distance: f32,
}

impl SphericalCoord {
    /// Create new spherical coordinate
    pub fn new(azimuth: f32, elevation: f32, distance: f32) -> Self {
        Self {
            azimuth,
            elevation,
            distance,
        }
    }

    /// Convert to Cartesian position
    pub fn to_cartesian(&self) -> Position3D {
        Position3D::from_spherical(self.azimuth, self.elevation, self.distance)
    }
}
