//! Sensor Volume Rendering Library
//!
//! This crate turns rectangular pyramid sensor parameters into GPU draw
//! commands, rebuilding cached buffers, programs and states only when the
//! inputs they depend on change.
//!
//! ## Key Components
//!
//! - [`geometry`] - Unit arcs, lateral sector loops, fans, outlines and the dome mesh
//! - [`scan_plane`] - Periodic scan plane sweep and its clock
//! - [`RectangularPyramidSensorVolume`] - Per-volume dirty-flag engine
//! - [`SensorScene`] - Primitive collection updated once per frame
//! - [`pipeline::ShaderCache`] - Content-addressed program cache shared by all volumes
//! - [`RenderDevice`] - Device seam, with [`WgpuDevice`] and [`HeadlessDevice`] backends

pub mod geometry;
pub mod pipeline;
pub mod scan_plane;
pub mod command;
pub mod device;
pub mod wgpu_device;
pub mod volume;
pub mod scene;
mod error;

pub use command::{
    CommandTemplate, DrawCommand, Face, FrameState, Pass, Passes, SceneMode, Topology, VolumePart,
};
pub use device::{BufferKey, HeadlessDevice, ProgramKey, RenderDevice, SubmitStats};
pub use error::{Axis, RenderError};
pub use geometry::{EllipsoidMeshProvider, UnitSphereMeshProvider};
pub use pipeline::{ProgramSource, ShaderCache};
pub use scan_plane::{ScanClock, ScanPlaneState};
pub use scene::{PrimitiveKey, SensorScene};
pub use volume::{FrameResources, PartMask, RebuildFlags, RectangularPyramidSensorVolume};
pub use wgpu_device::WgpuDevice;
