//! 4x4 affine matrix utilities
//!
//! Placement transforms for sensor volumes are stored as column-major 4x4
//! matrices in double precision and narrowed to f32 only for uniforms.

use crate::mat3::Mat3;
use crate::Vec3;

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f64; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Compose a rotation and a translation into an affine transform
pub fn from_rotation_translation(rotation: Mat3, translation: Vec3) -> Mat4 {
    [
        [rotation[0][0], rotation[0][1], rotation[0][2], 0.0],
        [rotation[1][0], rotation[1][1], rotation[1][2], 0.0],
        [rotation[2][0], rotation[2][1], rotation[2][2], 0.0],
        [translation.x, translation.y, translation.z, 1.0],
    ]
}

/// Embed a rotation with no translation
pub fn from_mat3(rotation: Mat3) -> Mat4 {
    from_rotation_translation(rotation, Vec3::ZERO)
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f64; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Equivalent to `mul(m, scale(s))` without building the scale matrix
///
/// The upper 3x3 columns are scaled; translation is left intact.
pub fn multiply_by_uniform_scale(m: Mat4, scale: f64) -> Mat4 {
    let mut result = m;
    for col in result.iter_mut().take(3) {
        for v in col.iter_mut().take(3) {
            *v *= scale;
        }
    }
    result
}

/// Transform a point (w = 1)
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
        m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
    )
}

/// Get the xyz part of a column
pub fn get_column(m: Mat4, col: usize) -> Vec3 {
    Vec3::new(m[col][0], m[col][1], m[col][2])
}

/// Translation component
pub fn get_translation(m: Mat4) -> Vec3 {
    get_column(m, 3)
}

/// Largest column length of the upper 3x3
pub fn maximum_scale(m: Mat4) -> f64 {
    get_column(m, 0)
        .length()
        .max(get_column(m, 1).length())
        .max(get_column(m, 2).length())
}

/// Narrow to single precision for GPU uniforms
pub fn to_f32(m: Mat4) -> [[f32; 4]; 4] {
    m.map(|col| col.map(|v| v as f32))
}
