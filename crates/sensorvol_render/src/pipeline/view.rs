//! Camera matrices for the offscreen renderer
//!
//! Column-major, right-handed, with wgpu's 0..1 clip depth.

/// Perspective projection mapping `near..far` to depth `0..1`
pub fn perspective_matrix(fov_y: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far * nf, -1.0],
        [0.0, 0.0, far * near * nf, 0.0],
    ]
}

/// Look-at view matrix
pub fn look_at_matrix(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let f = normalize([target[0] - eye[0], target[1] - eye[1], target[2] - eye[2]]);
    let s = normalize(cross(f, up));
    let u = cross(s, f);

    [
        [s[0], u[0], -f[0], 0.0],
        [s[1], u[1], -f[1], 0.0],
        [s[2], u[2], -f[2], 0.0],
        [-dot(s, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Multiply two column-major 4x4 matrices: result = a * b
pub fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut result = [[0.0f32; 4]; 4];
    for (col, out) in result.iter_mut().enumerate() {
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    result
}

/// Camera looking at `target` from `eye`, Z up
pub fn view_projection(eye: [f32; 3], target: [f32; 3], aspect: f32) -> [[f32; 4]; 4] {
    let offset = [eye[0] - target[0], eye[1] - target[1], eye[2] - target[2]];
    let distance = dot(offset, offset).sqrt();
    let near = (distance * 1e-3).max(1.0);
    let far = (distance * 4.0).max(near * 2.0);
    let forward = normalize([target[0] - eye[0], target[1] - eye[1], target[2] - eye[2]]);
    let up = if forward[2].abs() > 0.999 {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    mat4_mul(
        perspective_matrix(std::f32::consts::FRAC_PI_3, aspect, near, far),
        look_at_matrix(eye, target, up),
    )
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn project(m: [[f32; 4]; 4], p: [f32; 3]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
        }
        out
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_matrix(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 100.0);
        let near = project(proj, [0.0, 0.0, -0.1]);
        let far = project(proj, [0.0, 0.0, -100.0]);
        assert!((near[2] / near[3]).abs() < EPSILON);
        assert!((far[2] / far[3] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_look_at_moves_target_onto_negative_z() {
        let view = look_at_matrix([0.0, 0.0, 10.0], [0.0; 3], [0.0, 1.0, 0.0]);
        let p = project(view, [0.0; 3]);
        assert!(p[0].abs() < EPSILON && p[1].abs() < EPSILON);
        assert!((p[2] + 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_mat4_mul_identity() {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let view = look_at_matrix([1.0, 2.0, 3.0], [0.0; 3], [0.0, 0.0, 1.0]);
        assert_eq!(mat4_mul(identity, view), view);
        assert_eq!(mat4_mul(view, identity), view);
    }

    #[test]
    fn test_view_projection_along_up_axis() {
        let vp = view_projection([0.0, 0.0, 100.0], [0.0; 3], 1.5);
        assert!(vp.iter().flatten().all(|v| v.is_finite()));
    }
}
