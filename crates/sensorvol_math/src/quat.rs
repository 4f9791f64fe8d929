//! Unit quaternion for 3D orientation

use serde::{Deserialize, Serialize};

use crate::mat3::Mat3;
use crate::Vec3;

/// Rotation quaternion stored as (x, y, z, w) with w the scalar part
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis` (right-hand rule)
    ///
    /// The axis is normalized here. A zero axis yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalized();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Normalized linear interpolation along the shorter arc
    pub fn nlerp(self, other: Self, t: f64) -> Self {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        let sign = if dot < 0.0 { -1.0 } else { 1.0 };
        Self::new(
            self.x * (1.0 - t) + other.x * t * sign,
            self.y * (1.0 - t) + other.y * t * sign,
            self.z * (1.0 - t) + other.z * t * sign,
            self.w * (1.0 - t) + other.w * t * sign,
        )
        .normalized()
    }

    /// Convert to a column-major rotation matrix
    pub fn to_mat3(self) -> Mat3 {
        let Self { x, y, z, w } = self.normalized();

        let x2 = x * x;
        let y2 = y * y;
        let z2 = z * z;
        let xy = x * y;
        let xz = x * z;
        let yz = y * z;
        let wx = w * x;
        let wy = w * y;
        let wz = w * z;

        [
            [1.0 - 2.0 * (y2 + z2), 2.0 * (xy + wz), 2.0 * (xz - wy)],
            [2.0 * (xy - wz), 1.0 - 2.0 * (x2 + z2), 2.0 * (yz + wx)],
            [2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (x2 + y2)],
        ]
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(self, v: Vec3) -> Vec3 {
        crate::mat3::transform(self.to_mat3(), v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(Quat::IDENTITY.rotate(v).equals_epsilon(v, EPSILON));
    }

    #[test]
    fn test_axis_angle_about_z() {
        let q = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
        assert!(q.rotate(Vec3::X).equals_epsilon(Vec3::Y, EPSILON));
        assert!(q.rotate(Vec3::Y).equals_epsilon(-Vec3::X, EPSILON));
    }

    #[test]
    fn test_zero_axis_is_identity() {
        assert_eq!(Quat::from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }

    #[test]
    fn test_nlerp_endpoints() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::X, 1.0);
        let start = a.nlerp(b, 0.0);
        let end = a.nlerp(b, 1.0);
        assert!((start.w - a.w).abs() < EPSILON);
        assert!((end.x - b.x).abs() < EPSILON);
        assert!((end.w - b.w).abs() < EPSILON);
    }
}
