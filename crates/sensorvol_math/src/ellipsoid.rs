//! Reference ellipsoid and local tangent frames

use crate::mat3;
use crate::mat4::{self, Mat4};
use crate::Vec3;

/// Tolerance below which a position is considered to sit on the polar axis
const POLAR_EPSILON: f64 = 1e-14;

/// Axis-aligned ellipsoid centered at the origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    pub radii: Vec3,
}

impl Ellipsoid {
    /// The WGS84 Earth ellipsoid, in meters
    pub const WGS84: Self = Self {
        radii: Vec3::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179),
    };

    pub const UNIT_SPHERE: Self = Self { radii: Vec3::new(1.0, 1.0, 1.0) };

    pub const fn new(radii: Vec3) -> Self {
        Self { radii }
    }

    /// Component-wise 1 / r^2
    pub fn one_over_radii_squared(&self) -> Vec3 {
        Vec3::new(
            1.0 / (self.radii.x * self.radii.x),
            1.0 / (self.radii.y * self.radii.y),
            1.0 / (self.radii.z * self.radii.z),
        )
    }

    /// Outward normal of the surface through `position`'s geodetic latitude
    pub fn geodetic_surface_normal(&self, position: Vec3) -> Vec3 {
        position.component_mul(self.one_over_radii_squared()).normalized()
    }

    /// Local east-north-up frame at `origin`, as a transform into the fixed frame
    ///
    /// Columns are east, north, up, origin. On the polar axis east is taken as
    /// +Y and up follows the sign of z (the origin itself counts as north).
    pub fn east_north_up_to_fixed_frame(&self, origin: Vec3) -> Mat4 {
        let on_polar_axis = origin.x.abs() < POLAR_EPSILON && origin.y.abs() < POLAR_EPSILON;
        let (east, north, up) = if on_polar_axis {
            let sign = if origin.z < 0.0 { -1.0 } else { 1.0 };
            (Vec3::Y, Vec3::new(-sign, 0.0, 0.0), Vec3::new(0.0, 0.0, sign))
        } else {
            let up = self.geodetic_surface_normal(origin);
            let east = Vec3::new(-origin.y, origin.x, 0.0).normalized();
            let north = up.cross(east);
            (east, north, up)
        };

        mat4::from_rotation_translation(mat3::from_columns(east, north, up), origin)
    }
}

/// East-north-up frame on the WGS84 ellipsoid
pub fn east_north_up_to_fixed_frame(origin: Vec3) -> Mat4 {
    Ellipsoid::WGS84.east_north_up_to_fixed_frame(origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat4::get_column;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_enu_on_equator_at_prime_meridian() {
        let origin = Vec3::new(Ellipsoid::WGS84.radii.x, 0.0, 0.0);
        let m = east_north_up_to_fixed_frame(origin);
        assert!(get_column(m, 0).equals_epsilon(Vec3::Y, EPSILON), "east");
        assert!(get_column(m, 1).equals_epsilon(Vec3::Z, EPSILON), "north");
        assert!(get_column(m, 2).equals_epsilon(Vec3::X, EPSILON), "up");
        assert_eq!(get_column(m, 3), origin);
    }

    #[test]
    fn test_enu_is_right_handed() {
        let origin = Vec3::new(1_000_000.0, 2_000_000.0, 5_000_000.0);
        let m = east_north_up_to_fixed_frame(origin);
        let east = get_column(m, 0);
        let north = get_column(m, 1);
        let up = get_column(m, 2);
        assert!(east.cross(north).equals_epsilon(up, EPSILON));
        assert!(east.dot(up).abs() < EPSILON);
    }

    #[test]
    fn test_enu_at_poles() {
        let south = east_north_up_to_fixed_frame(Vec3::new(0.0, 0.0, -6_356_752.0));
        assert!(get_column(south, 2).equals_epsilon(-Vec3::Z, EPSILON));
        let east = get_column(south, 0);
        let north = get_column(south, 1);
        assert!(east.cross(north).equals_epsilon(-Vec3::Z, EPSILON));

        let center = east_north_up_to_fixed_frame(Vec3::ZERO);
        assert!(get_column(center, 2).equals_epsilon(Vec3::Z, EPSILON));
    }
}
