//! Pipeline components
//!
//! GPU data layouts, fixed-function render states, shader composition and
//! the shared program cache.

pub mod types;
pub mod render_state;
pub mod shaders;
pub mod shader_cache;
pub mod view;

pub use types::{SensorUniforms, VolumeVertex, ATTRIBUTE_LOCATIONS, KIND_LINE, KIND_SURFACE};
pub use render_state::{build_render_states, CullFace, RenderState, RenderStates};
pub use shaders::{ProgramSource, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use shader_cache::{ProgramHandle, ProgramId, ShaderCache};
pub use view::{look_at_matrix, mat4_mul, perspective_matrix, view_projection};
