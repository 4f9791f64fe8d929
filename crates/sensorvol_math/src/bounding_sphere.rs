//! Bounding sphere used for culling sensor volumes

use crate::mat4::{self, Mat4};
use crate::Vec3;

/// Sphere enclosing a primitive in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self { center: Vec3::ZERO, radius: 0.0 }
    }
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Apply an affine transform; the radius grows by the largest axis scale
    pub fn transform(self, m: Mat4) -> Self {
        Self {
            center: mat4::transform_point(m, self.center),
            radius: mat4::maximum_scale(m) * self.radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat3;

    #[test]
    fn test_transform_moves_center() {
        let m = mat4::from_rotation_translation(mat3::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
        let s = BoundingSphere::new(Vec3::ZERO, 5.0).transform(m);
        assert_eq!(s.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.radius, 5.0);
    }

    #[test]
    fn test_infinite_radius_survives_transform() {
        let s = BoundingSphere::new(Vec3::ZERO, f64::INFINITY).transform(mat4::IDENTITY);
        assert!(s.radius.is_infinite());
    }
}
