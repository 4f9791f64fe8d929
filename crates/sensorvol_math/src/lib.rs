//! 3D Mathematics Library
//!
//! This crate provides the vector, rotation, and frame types used to place
//! sensor volumes in an Earth-fixed scene.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components (f64)
//! - [`Quat`] - Unit quaternion orientation
//! - [`Mat3`] / [`Mat4`] - Column-major rotation and affine matrices
//!
//! ## Geometry Types
//!
//! - [`BoundingSphere`] - Culling volume for a primitive
//! - [`Spherical`] - Clock/cone/magnitude direction
//! - [`Ellipsoid`] - Reference ellipsoid with east-north-up frames

mod vec3;
mod quat;
pub mod mat3;
pub mod mat4;
pub mod bounding_sphere;
pub mod spherical;
pub mod ellipsoid;

pub use vec3::Vec3;
pub use quat::Quat;
pub use mat3::Mat3;
pub use mat4::Mat4;
pub use bounding_sphere::BoundingSphere;
pub use spherical::Spherical;
pub use ellipsoid::{Ellipsoid, east_north_up_to_fixed_frame};
