//! Spherical coordinates for sensor pointing directions

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// A direction expressed as clock angle (about +Z from +X), cone angle
/// (from +Z), and magnitude
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    pub clock: f64,
    pub cone: f64,
    pub magnitude: f64,
}

impl Spherical {
    /// Create a spherical coordinate; `magnitude` is typically 1 for directions
    pub const fn new(clock: f64, cone: f64, magnitude: f64) -> Self {
        Self { clock, cone, magnitude }
    }

    /// A unit-length direction
    pub const fn unit(clock: f64, cone: f64) -> Self {
        Self::new(clock, cone, 1.0)
    }

    /// Convert from a Cartesian vector
    pub fn from_cartesian(v: Vec3) -> Self {
        let radial_squared = v.x * v.x + v.y * v.y;
        Self {
            clock: v.y.atan2(v.x),
            cone: radial_squared.sqrt().atan2(v.z),
            magnitude: (radial_squared + v.z * v.z).sqrt(),
        }
    }

    /// Same direction with unit magnitude
    pub fn normalized(self) -> Self {
        Self { magnitude: 1.0, ..self }
    }

    /// Convert back to a Cartesian vector
    pub fn to_cartesian(self) -> Vec3 {
        let (sin_cone, cos_cone) = self.cone.sin_cos();
        let (sin_clock, cos_clock) = self.clock.sin_cos();
        Vec3::new(
            self.magnitude * sin_cone * cos_clock,
            self.magnitude * sin_cone * sin_clock,
            self.magnitude * cos_cone,
        )
    }
}
