//! Ellipsoid mesh provider for the dome
//!
//! The dome is drawn as a full unit sphere; the fragment shader discards
//! everything outside the pyramid's aperture.

use sensorvol_math::Vec3;

/// Stack and slice partitions used for the dome surface and its outline
pub const DOME_PARTITIONS: u32 = 32;

/// Indexed mesh in unit space
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EllipsoidMesh {
    pub positions: Vec<Vec3>,
    /// Triangle list indices for surfaces, line list indices for outlines
    pub indices: Vec<u32>,
}

/// Source of unit ellipsoid meshes
pub trait EllipsoidMeshProvider {
    /// Closed surface triangulation
    fn build_ellipsoid_mesh(&self, stack_partitions: u32, slice_partitions: u32) -> EllipsoidMesh;

    /// Latitude rings and meridians as a line list
    fn build_ellipsoid_outline(&self, stack_partitions: u32, slice_partitions: u32)
        -> EllipsoidMesh;
}

/// Latitude/longitude sphere with radius 1
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitSphereMeshProvider;

impl UnitSphereMeshProvider {
    /// Grid of `(stacks + 1) x (slices + 1)` points from the +Z pole to the -Z pole
    fn grid(stacks: u32, slices: u32) -> Vec<Vec3> {
        let mut positions = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for i in 0..=stacks {
            let phi = std::f64::consts::PI * i as f64 / stacks as f64;
            let (sin_phi, cos_phi) = phi.sin_cos();
            for j in 0..=slices {
                let theta = std::f64::consts::TAU * j as f64 / slices as f64;
                let (sin_theta, cos_theta) = theta.sin_cos();
                positions.push(Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi));
            }
        }
        positions
    }
}

impl EllipsoidMeshProvider for UnitSphereMeshProvider {
    fn build_ellipsoid_mesh(&self, stack_partitions: u32, slice_partitions: u32) -> EllipsoidMesh {
        let stacks = stack_partitions.max(2);
        let slices = slice_partitions.max(3);
        let positions = Self::grid(stacks, slices);
        let row = slices + 1;

        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                // outward (counter-clockwise seen from outside)
                if i != 0 {
                    indices.extend_from_slice(&[a, b, a + 1]);
                }
                if i != stacks - 1 {
                    indices.extend_from_slice(&[a + 1, b, b + 1]);
                }
            }
        }

        EllipsoidMesh { positions, indices }
    }

    fn build_ellipsoid_outline(
        &self,
        stack_partitions: u32,
        slice_partitions: u32,
    ) -> EllipsoidMesh {
        let stacks = stack_partitions.max(2);
        let slices = slice_partitions.max(3);
        let positions = Self::grid(stacks, slices);
        let row = slices + 1;

        let mut indices = Vec::new();
        // latitude rings, skipping the poles
        for i in 1..stacks {
            for j in 0..slices {
                let a = i * row + j;
                indices.extend_from_slice(&[a, a + 1]);
            }
        }
        // meridians
        for j in 0..slices {
            for i in 0..stacks {
                let a = i * row + j;
                indices.extend_from_slice(&[a, a + row]);
            }
        }

        EllipsoidMesh { positions, indices }
    }
}
