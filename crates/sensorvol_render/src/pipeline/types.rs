//! GPU-compatible data types for sensor volume rendering
//!
//! These types are designed to match the shader layouts exactly.
//! All types derive Pod and Zeroable for safe GPU buffer operations.

use bytemuck::{Pod, Zeroable};

/// A volume vertex: position in unit (model) space and a face normal
///
/// Line parts carry a zero normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct VolumeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VolumeVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Vertex with no normal, for line lists
    pub fn line(position: [f32; 3]) -> Self {
        Self { position, normal: [0.0; 3] }
    }

    /// Vertex buffer layout matching `sensor_vs.wgsl`
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VolumeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Shader attribute name to location bindings for every sensor program
pub const ATTRIBUTE_LOCATIONS: &[(&str, u32)] = &[("position", 0), ("normal", 1)];

/// Value of [`SensorUniforms::kind`] for shaded surfaces
pub const KIND_SURFACE: u32 = 0;
/// Value of [`SensorUniforms::kind`] for outline lines
pub const KIND_LINE: u32 = 1;

/// Per-command uniform snapshot
/// Layout: 208 bytes total (must match `SensorUniforms` in sensor_common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SensorUniforms {
    /// Camera view-projection (64 bytes)
    pub view_projection: [[f32; 4]; 4],
    /// Model matrix including the radius scale (64 bytes)
    pub model: [[f32; 4]; 4],
    pub line_color: [f32; 4],
    pub intersection_color: [f32; 4],
    /// Material color; the scan plane color for scan plane commands
    pub material_color: [f32; 4],
    pub x_half_angle: f32,
    pub y_half_angle: f32,
    pub radius: f32,
    pub intersection_width: f32,
    /// +1 for front faces, -1 for the back face pass
    pub normal_direction: f32,
    /// [`KIND_SURFACE`] or [`KIND_LINE`]
    pub kind: u32,
    pub show_intersection: u32,
    pub show_through_ellipsoid: u32,
}

impl Default for SensorUniforms {
    fn default() -> Self {
        const IDENTITY: [[f32; 4]; 4] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            view_projection: IDENTITY,
            model: IDENTITY,
            line_color: [1.0; 4],
            intersection_color: [1.0; 4],
            material_color: [1.0; 4],
            x_half_angle: 0.0,
            y_half_angle: 0.0,
            radius: 1.0,
            intersection_width: 1.0,
            normal_direction: 1.0,
            kind: KIND_SURFACE,
            show_intersection: 0,
            show_through_ellipsoid: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<VolumeVertex>(), 24);
    }

    #[test]
    fn test_uniforms_size() {
        assert_eq!(std::mem::size_of::<SensorUniforms>(), 208);
        assert_eq!(std::mem::size_of::<SensorUniforms>() % 16, 0);
    }

    #[test]
    fn test_buffer_layout_stride() {
        let layout = VolumeVertex::buffer_layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), ATTRIBUTE_LOCATIONS.len());
    }
}
