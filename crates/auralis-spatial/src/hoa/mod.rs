//! Higher-Order Ambisonics (HOA)
//!
//! Spherical-harmonic sound-field encoding:
//! - Orders 1 through 7 (4 to 64 channels)
//! - ACN channel ordering, N3D normalization (SN3D available by conversion)
//! - Real spherical harmonics at arbitrary order via Legendre recurrences

mod encoder;

pub use encoder::AmbisonicEncoder;

use serde::{Deserialize, Serialize};

use auralis_core::Sample;

use crate::error::{SpatialError, SpatialResult};

/// Ambisonic order (determines spatial resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmbisonicOrder {
    /// First order (4 channels) - basic 3D
    First = 1,
    /// Second order (9 channels) - good localization
    Second = 2,
    /// Third order (16 channels) - high quality
    Third = 3,
    /// Fourth order (25 channels) - studio quality
    Fourth = 4,
    /// Fifth order (36 channels) - theatrical
    Fifth = 5,
    /// Sixth order (49 channels) - research
    Sixth = 6,
    /// Seventh order (64 channels) - maximum
    Seventh = 7,
}

impl AmbisonicOrder {
    /// Get channel count for this order: (order + 1)^2
    pub fn channel_count(&self) -> usize {
        let n = *self as usize;
        (n + 1) * (n + 1)
    }

    /// Create from order number
    pub fn from_order(order: usize) -> SpatialResult<Self> {
        match order {
            1 => Ok(AmbisonicOrder::First),
            2 => Ok(AmbisonicOrder::Second),
            3 => Ok(AmbisonicOrder::Third),
            4 => Ok(AmbisonicOrder::Fourth),
            5 => Ok(AmbisonicOrder::Fifth),
            6 => Ok(AmbisonicOrder::Sixth),
            7 => Ok(AmbisonicOrder::Seventh),
            _ => Err(SpatialError::InvalidAmbisonicOrder(order)),
        }
    }

    /// Get order number
    pub fn as_usize(&self) -> usize {
        *self as usize
    }
}

impl Default for AmbisonicOrder {
    fn default() -> Self {
        Self::Third
    }
}

/// Normalization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// N3D (fully normalized) - what the encoder produces
    #[default]
    N3D,
    /// SN3D (Schmidt semi-normalized) - AmbiX convention
    Sn3d,
}

/// Channel ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrdering {
    /// ACN (Ambisonic Channel Number)
    #[default]
    Acn,
}

/// Complete ambisonic stream description, attached to encoded output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbisonicFormat {
    /// Ambisonic order
    pub order: AmbisonicOrder,
    /// Normalization scheme
    pub normalization: Normalization,
    /// Channel ordering
    pub ordering: ChannelOrdering,
}

impl AmbisonicFormat {
    /// N3D + ACN at the given order
    pub fn n3d_acn(order: AmbisonicOrder) -> Self {
        Self {
            order,
            normalization: Normalization::N3D,
            ordering: ChannelOrdering::Acn,
        }
    }

    /// Channel count for this format
    pub fn channel_count(&self) -> usize {
        self.order.channel_count()
    }
}

impl Default for AmbisonicFormat {
    fn default() -> Self {
        Self::n3d_acn(AmbisonicOrder::default())
    }
}

/// ACN channel index from (order, degree)
pub fn acn_index(order: i32, degree: i32) -> usize {
    (order * order + order + degree) as usize
}

/// Get (order, degree) from ACN index
pub fn acn_to_order_degree(acn: usize) -> (i32, i32) {
    let order = (acn as f64).sqrt().floor() as i32;
    let degree = acn as i32 - order * order - order;
    (order, degree)
}

/// Rescale an N3D channel set to SN3D in place.
///
/// SN3D divides each order-l channel by sqrt(2l + 1); the W channel is
/// unchanged.
pub fn convert_n3d_to_sn3d(channels: &mut [Vec<Sample>]) {
    for (acn, channel) in channels.iter_mut().enumerate() {
        let (order, _) = acn_to_order_degree(acn);
        let scale = 1.0 / ((2 * order + 1) as f32).sqrt();
        for sample in channel.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Spherical harmonic coefficients for one direction
#[derive(Debug, Clone)]
pub struct SphericalHarmonics {
    /// Coefficients in ACN order
    pub coeffs: Vec<f32>,
    /// Order
    pub order: AmbisonicOrder,
}

impl SphericalHarmonics {
    /// Create zeroed coefficients for an order
    pub fn new(order: AmbisonicOrder) -> Self {
        Self {
            coeffs: vec![0.0; order.channel_count()],
            order,
        }
    }

    /// Compute spherical harmonics for a direction
    pub fn from_direction(azimuth: f32, elevation: f32, order: AmbisonicOrder) -> Self {
        let mut sh = Self::new(order);
        sh.compute_for_direction(azimuth, elevation);
        sh
    }

    /// Compute N3D/ACN coefficients for a direction (degrees).
    ///
    /// Real spherical harmonics without the Condon-Shortley phase, evaluated
    /// with the standard associated-Legendre recurrences so every order up
    /// to 7 is exact, not just the hand-unrolled low degrees.
    pub fn compute_for_direction(&mut self, azimuth: f32, elevation: f32) {
        let az = azimuth.to_radians() as f64;
        let x = (elevation.to_radians() as f64).sin();
        let n = self.order.as_usize();

        // Associated Legendre values P[l][m] for x = sin(elevation).
        let mut p = vec![vec![0.0_f64; n + 1]; n + 1];
        let somx2 = (1.0 - x * x).max(0.0).sqrt();
        let mut pmm = 1.0_f64;
        for m in 0..=n {
            p[m][m] = pmm;
            if m < n {
                p[m + 1][m] = x * (2 * m + 1) as f64 * pmm;
                for l in (m + 2)..=n {
                    p[l][m] = ((2 * l - 1) as f64 * x * p[l - 1][m]
                        - (l + m - 1) as f64 * p[l - 2][m])
                        / (l - m) as f64;
                }
            }
            pmm *= (2 * m + 1) as f64 * somx2;
        }

        let four_pi = 4.0 * std::f64::consts::PI;
        for l in 0..=n {
            for m in -(l as i32)..=(l as i32) {
                let ma = m.unsigned_abs() as usize;
                let norm = (((2 * l + 1) as f64 / four_pi)
                    * (factorial(l - ma) / factorial(l + ma)))
                .sqrt();

                let value = if m > 0 {
                    std::f64::consts::SQRT_2 * norm * p[l][ma] * ((ma as f64) * az).cos()
                } else if m < 0 {
                    std::f64::consts::SQRT_2 * norm * p[l][ma] * ((ma as f64) * az).sin()
                } else {
                    norm * p[l][0]
                };

                self.coeffs[acn_index(l as i32, m)] = value as f32;
            }
        }
    }

    /// Get coefficient by ACN index
    pub fn get(&self, acn: usize) -> f32 {
        self.coeffs.get(acn).copied().unwrap_or(0.0)
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}
