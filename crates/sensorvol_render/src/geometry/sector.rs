//! Lateral sector geometry of a rectangular pyramid
//!
//! The pyramid's four side walls are lofted from two unit arcs, one in the
//! ZY plane and one in the ZX plane. Each arc spans the *coupled* angular
//! deviation `atan(cos(other) * tan(own))`, so that after rotating the arcs
//! out by the opposite half-angle the four walls meet in a rectangular
//! aperture rather than a cone.
//!
//! All positions are on the unit sphere; the volume's radius is applied by
//! the model matrix.

use sensorvol_core::ScanPlaneMode;
use sensorvol_math::{mat3, Vec3};

use crate::pipeline::VolumeVertex;

/// The two principal-plane arcs a sector is built from
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitArcs {
    /// Points `(0, sin φ, cos φ)`
    pub zy: Vec<Vec3>,
    /// Points `(sin φ, 0, cos φ)`
    pub zx: Vec<Vec3>,
}

/// Half-extent of the ZY arc for a pyramid with the given half-angles
pub fn max_zy_deviation(x_half_angle: f64, y_half_angle: f64) -> f64 {
    (x_half_angle.cos() * y_half_angle.tan()).atan()
}

/// Half-extent of the ZX arc for a pyramid with the given half-angles
pub fn max_zx_deviation(x_half_angle: f64, y_half_angle: f64) -> f64 {
    (y_half_angle.cos() * x_half_angle.tan()).atan()
}

/// Sample the two unit arcs with `slice` points each, evenly spaced by angle.
///
/// Fewer than two slices yields empty arcs.
pub fn build_unit_arcs(x_half_angle: f64, y_half_angle: f64, slice: usize) -> UnitArcs {
    if slice < 2 {
        return UnitArcs::default();
    }

    let max_y = max_zy_deviation(x_half_angle, y_half_angle);
    let max_x = max_zx_deviation(x_half_angle, y_half_angle);
    let last = (slice - 1) as f64;

    let mut arcs = UnitArcs {
        zy: Vec::with_capacity(slice),
        zx: Vec::with_capacity(slice),
    };
    for i in 0..slice {
        let t = 2.0 * i as f64 / last - 1.0;
        let (sin_y, cos_y) = (max_y * t).sin_cos();
        arcs.zy.push(Vec3::new(0.0, sin_y, cos_y));
        let (sin_x, cos_x) = (max_x * t).sin_cos();
        arcs.zx.push(Vec3::new(sin_x, 0.0, cos_x));
    }
    arcs
}

/// Rotate the arcs into the four side walls of the pyramid.
///
/// Loop order is +X wall, +Y wall, -X wall, -Y wall; the second and third
/// loops are reversed so that each loop ends where the next one begins.
pub fn build_sector_loop(x_half_angle: f64, y_half_angle: f64, arcs: &UnitArcs) -> [Vec<Vec3>; 4] {
    let rotate = |points: &[Vec3], m: mat3::Mat3| -> Vec<Vec3> {
        points.iter().map(|p| mat3::transform(m, *p)).collect()
    };

    let pos_x = rotate(&arcs.zy, mat3::from_rotation_y(x_half_angle));
    let mut pos_y = rotate(&arcs.zx, mat3::from_rotation_x(-y_half_angle));
    pos_y.reverse();
    let mut neg_x = rotate(&arcs.zy, mat3::from_rotation_y(-x_half_angle));
    neg_x.reverse();
    let neg_y = rotate(&arcs.zx, mat3::from_rotation_x(y_half_angle));

    [pos_x, pos_y, neg_x, neg_y]
}

/// Outward facet normal of one wall loop
fn loop_normal(points: &[Vec3]) -> Vec3 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => -first.cross(*last).normalized(),
        _ => Vec3::ZERO,
    }
}

/// Triangulate each loop as a fan from the apex with one flat normal per loop
pub fn triangulate_fan(loops: &[Vec<Vec3>]) -> Vec<VolumeVertex> {
    let triangles: usize = loops.iter().map(|l| l.len().saturating_sub(1)).sum();
    let mut vertices = Vec::with_capacity(triangles * 3);

    for points in loops {
        let normal = loop_normal(points).to_f32_array();
        for pair in points.windows(2) {
            vertices.push(VolumeVertex::new([0.0; 3], normal));
            vertices.push(VolumeVertex::new(pair[0].to_f32_array(), normal));
            vertices.push(VolumeVertex::new(pair[1].to_f32_array(), normal));
        }
    }
    vertices
}

/// Apex-to-corner edges: one line from the origin to each loop's first point
pub fn sector_line_vertices(loops: &[Vec<Vec3>]) -> Vec<VolumeVertex> {
    loops
        .iter()
        .filter_map(|points| points.first())
        .flat_map(|first| [VolumeVertex::line([0.0; 3]), VolumeVertex::line(first.to_f32_array())])
        .collect()
}

/// Outline of the aperture rim: consecutive point pairs along every loop
pub fn segment_line_vertices(loops: &[Vec<Vec3>]) -> Vec<VolumeVertex> {
    loops
        .iter()
        .flat_map(|points| points.windows(2))
        .flat_map(|pair| {
            [VolumeVertex::line(pair[0].to_f32_array()), VolumeVertex::line(pair[1].to_f32_array())]
        })
        .collect()
}

/// Half-disc fan swept by the scan plane, in unit space
///
/// The horizontal plane lies in ZX and rotates about X; the vertical plane
/// lies in ZY and rotates about Y.
pub fn scan_plane_fan(mode: ScanPlaneMode, slice: usize) -> Vec<VolumeVertex> {
    let half_pi = std::f64::consts::FRAC_PI_2;
    let (arc, normal) = match mode {
        ScanPlaneMode::Horizontal => (build_unit_arcs(half_pi, 0.0, slice).zx, [0.0, 1.0, 0.0]),
        ScanPlaneMode::Vertical => (build_unit_arcs(0.0, half_pi, slice).zy, [1.0, 0.0, 0.0]),
    };

    let mut vertices = Vec::with_capacity(arc.len().saturating_sub(1) * 3);
    for pair in arc.windows(2) {
        vertices.push(VolumeVertex::new([0.0; 3], normal));
        vertices.push(VolumeVertex::new(pair[0].to_f32_array(), normal));
        vertices.push(VolumeVertex::new(pair[1].to_f32_array(), normal));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn arc_angle_zy(p: Vec3) -> f64 {
        p.y.atan2(p.z)
    }

    fn arc_angle_zx(p: Vec3) -> f64 {
        p.x.atan2(p.z)
    }

    const HALF_ANGLES: [(f64, f64); 5] =
        [(0.1, 0.1), (0.3, 0.7), (0.7, 0.3), (1.2, 0.05), (1.5, 1.5)];

    #[test]
    fn test_arc_lengths_and_endpoints() {
        for (x, y) in HALF_ANGLES {
            for slice in [2usize, 3, 8, 32] {
                let arcs = build_unit_arcs(x, y, slice);
                assert_eq!(arcs.zy.len(), slice);
                assert_eq!(arcs.zx.len(), slice);

                let max_y = max_zy_deviation(x, y);
                let max_x = max_zx_deviation(x, y);
                assert!(approx_eq(arc_angle_zy(arcs.zy[0]), -max_y));
                assert!(approx_eq(arc_angle_zy(arcs.zy[slice - 1]), max_y));
                assert!(approx_eq(arc_angle_zx(arcs.zx[0]), -max_x));
                assert!(approx_eq(arc_angle_zx(arcs.zx[slice - 1]), max_x));
            }
        }
    }

    #[test]
    fn test_arcs_are_symmetric_about_zero() {
        for (x, y) in HALF_ANGLES {
            let slice = 17;
            let arcs = build_unit_arcs(x, y, slice);
            for i in 0..slice {
                let j = slice - 1 - i;
                assert!(approx_eq(arc_angle_zy(arcs.zy[i]), -arc_angle_zy(arcs.zy[j])));
                assert!(approx_eq(arc_angle_zx(arcs.zx[i]), -arc_angle_zx(arcs.zx[j])));
            }
            // odd slice count puts the middle sample on the axis
            assert!(arcs.zy[slice / 2].equals_epsilon(Vec3::Z, EPSILON));
        }
    }

    #[test]
    fn test_arc_points_are_unit_length() {
        let arcs = build_unit_arcs(0.4, 0.6, 10);
        for p in arcs.zy.iter().chain(arcs.zx.iter()) {
            assert!(approx_eq(p.length(), 1.0));
        }
    }

    #[test]
    fn test_degenerate_slice_counts() {
        assert_eq!(build_unit_arcs(0.5, 0.5, 0), UnitArcs::default());
        assert_eq!(build_unit_arcs(0.5, 0.5, 1), UnitArcs::default());
        let loops = build_sector_loop(0.5, 0.5, &UnitArcs::default());
        assert!(triangulate_fan(&loops).is_empty());
        assert!(sector_line_vertices(&loops).is_empty());
        assert!(segment_line_vertices(&loops).is_empty());
    }

    #[test]
    fn test_sector_loops_close() {
        for (x, y) in HALF_ANGLES {
            let loops = build_sector_loop(x, y, &build_unit_arcs(x, y, 12));
            for l in &loops {
                assert_eq!(l.len(), 12);
            }
            for i in 0..4 {
                let end = *loops[i].last().unwrap();
                let start = loops[(i + 1) % 4][0];
                assert!(
                    end.equals_epsilon(start, EPSILON),
                    "loop {} end {:?} != next start {:?}",
                    i,
                    end,
                    start
                );
            }
        }
    }

    #[test]
    fn test_sector_corners_match_rectangular_aperture() {
        let (x, y) = (0.3, 0.6);
        let loops = build_sector_loop(x, y, &build_unit_arcs(x, y, 5));
        for corner in loops.iter().map(|l| l[0]) {
            assert!(approx_eq((corner.x / corner.z).abs(), x.tan()));
            assert!(approx_eq((corner.y / corner.z).abs(), y.tan()));
        }
    }

    #[test]
    fn test_fan_normals_face_outward() {
        let (x, y) = (0.4, 0.3);
        let loops = build_sector_loop(x, y, &build_unit_arcs(x, y, 8));
        let vertices = triangulate_fan(&loops);
        assert_eq!(vertices.len(), 4 * 7 * 3);

        // +X, +Y, -X, -Y walls in loop order
        let expected_sign = [(0usize, 1.0f32), (1, 1.0), (0, -1.0), (1, -1.0)];
        for (loop_index, (axis, sign)) in expected_sign.iter().enumerate() {
            let normal = vertices[loop_index * 7 * 3].normal;
            assert!(normal[*axis] * sign > 0.0, "loop {} normal {:?}", loop_index, normal);
            // apex first in every triangle
            assert_eq!(vertices[loop_index * 7 * 3].position, [0.0; 3]);
        }
    }

    #[test]
    fn test_line_vertex_counts() {
        let loops = build_sector_loop(0.2, 0.2, &build_unit_arcs(0.2, 0.2, 6));
        assert_eq!(sector_line_vertices(&loops).len(), 8);
        assert_eq!(segment_line_vertices(&loops).len(), 4 * 5 * 2);
    }

    #[test]
    fn test_scan_plane_fans() {
        let horizontal = scan_plane_fan(ScanPlaneMode::Horizontal, 9);
        assert_eq!(horizontal.len(), 8 * 3);
        assert!(horizontal.iter().all(|v| v.position[1] == 0.0));
        // spans the full half-disc from -X to +X
        assert!((horizontal[1].position[0] + 1.0).abs() < 1e-6);
        assert!((horizontal.last().unwrap().position[0] - 1.0).abs() < 1e-6);

        let vertical = scan_plane_fan(ScanPlaneMode::Vertical, 9);
        assert!(vertical.iter().all(|v| v.position[0] == 0.0));
    }
}
