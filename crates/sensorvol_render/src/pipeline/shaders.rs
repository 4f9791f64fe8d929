//! Shader source composition
//!
//! Every sensor program shares `sensor_common.wgsl`. Fragment stages splice
//! the material's `sensor_material` snippet between the common block and the
//! part's fragment entry point, so two volumes with identical materials end
//! up with identical source text and share one compiled program.

use sensorvol_core::Material;

use super::types::ATTRIBUTE_LOCATIONS;

const SENSOR_COMMON: &str = include_str!("../shaders/sensor_common.wgsl");
const SENSOR_VS: &str = include_str!("../shaders/sensor_vs.wgsl");
const SENSOR_FS: &str = include_str!("../shaders/sensor_fs.wgsl");
const SCAN_PLANE_FS: &str = include_str!("../shaders/scan_plane_fs.wgsl");

/// Vertex entry point in every composed vertex source
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point in every composed fragment source
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Complete source text of one program; the shader cache key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramSource {
    pub vertex: String,
    pub fragment: String,
    pub attributes: &'static [(&'static str, u32)],
}

impl ProgramSource {
    fn compose(material: &Material, fragment_main: &str) -> Self {
        Self {
            vertex: [SENSOR_COMMON, SENSOR_VS].join("\n"),
            fragment: [SENSOR_COMMON, material.shader_source(), fragment_main].join("\n"),
            attributes: ATTRIBUTE_LOCATIONS,
        }
    }

    /// Program for surfaces and outlines shaded with `material`
    pub fn sensor(material: &Material) -> Self {
        Self::compose(material, SENSOR_FS)
    }

    /// Program for the scan plane
    pub fn scan_plane(material: &Material) -> Self {
        Self::compose(material, SCAN_PLANE_FS)
    }
}
