//! 3x3 rotation matrix utilities

use crate::Vec3;

/// 3x3 matrix type (column-major)
pub type Mat3 = [[f64; 3]; 3];

/// Identity matrix
pub const IDENTITY: Mat3 = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Create a rotation matrix in the plane spanned by axes `p1` and `p2`.
///
/// Positive angles rotate `p1` toward `p2`.
///
/// # Arguments
/// * `angle` - Rotation angle in radians
/// * `p1`, `p2` - Indices of the axes forming the rotation plane (0=X, 1=Y, 2=Z)
pub fn plane_rotation(angle: f64, p1: usize, p2: usize) -> Mat3 {
    let cs = angle.cos();
    let sn = angle.sin();

    let mut m = IDENTITY;

    m[p1][p1] = cs;
    m[p2][p2] = cs;
    m[p1][p2] = sn;
    m[p2][p1] = -sn;

    m
}

/// Right-handed rotation about the X axis
pub fn from_rotation_x(angle: f64) -> Mat3 {
    plane_rotation(angle, 1, 2)
}

/// Right-handed rotation about the Y axis
pub fn from_rotation_y(angle: f64) -> Mat3 {
    plane_rotation(angle, 2, 0)
}

/// Right-handed rotation about the Z axis
pub fn from_rotation_z(angle: f64) -> Mat3 {
    plane_rotation(angle, 0, 1)
}

/// Multiply two 3x3 matrices: result = a * b
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat3, b: Mat3) -> Mat3 {
    let mut result = [[0.0f64; 3]; 3];

    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a vector: result = M * v
pub fn transform(m: Mat3, v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
    )
}

/// Build a matrix from three column vectors
pub fn from_columns(c0: Vec3, c1: Vec3, c2: Vec3) -> Mat3 {
    [[c0.x, c0.y, c0.z], [c1.x, c1.y, c1.z], [c2.x, c2.y, c2.z]]
}

/// Get a column vector from a matrix
pub fn get_column(m: Mat3, col: usize) -> Vec3 {
    Vec3::new(m[col][0], m[col][1], m[col][2])
}
