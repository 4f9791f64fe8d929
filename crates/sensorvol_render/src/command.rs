//! Draw commands and per-frame state
//!
//! Volumes append [`DrawCommand`]s to [`FrameState::command_list`]; the host
//! hands the list to a [`RenderDevice`](crate::RenderDevice) once every
//! primitive has been updated.

use std::sync::Arc;

use sensorvol_core::SimTime;

use crate::device::{BufferKey, ProgramKey};
use crate::pipeline::{RenderState, SensorUniforms, KIND_LINE};

/// Render pass a command belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {
    Opaque,
    Translucent,
}

/// Primitive topology of a part's vertex buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    LineList,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Which side of a double-sided surface a command draws
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
}

/// Independently toggled renderable part of a volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VolumePart {
    LateralSurfaces,
    SectorLines,
    SectorSegmentLines,
    DomeSurfaces,
    DomeLines,
    ScanPlane,
}

impl VolumePart {
    /// Every part, in draw order
    pub const ALL: [VolumePart; 6] = [
        VolumePart::LateralSurfaces,
        VolumePart::SectorLines,
        VolumePart::SectorSegmentLines,
        VolumePart::DomeSurfaces,
        VolumePart::DomeLines,
        VolumePart::ScanPlane,
    ];

    pub fn is_line(self) -> bool {
        matches!(
            self,
            VolumePart::SectorLines | VolumePart::SectorSegmentLines | VolumePart::DomeLines
        )
    }

    pub fn topology(self) -> Topology {
        if self.is_line() {
            Topology::LineList
        } else {
            Topology::TriangleList
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolumePart::LateralSurfaces => "Sensor Lateral Surfaces",
            VolumePart::SectorLines => "Sensor Sector Lines",
            VolumePart::SectorSegmentLines => "Sensor Sector Segment Lines",
            VolumePart::DomeSurfaces => "Sensor Dome Surfaces",
            VolumePart::DomeLines => "Sensor Dome Lines",
            VolumePart::ScanPlane => "Sensor Scan Plane",
        }
    }
}

/// A fully resolved draw: buffer, program, fixed-function state and uniforms
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    /// Tag of the volume that emitted the command
    pub owner: Option<Arc<str>>,
    pub part: VolumePart,
    pub face: Face,
    pub pass: Pass,
    pub topology: Topology,
    pub buffer: BufferKey,
    pub vertex_count: u32,
    pub program: ProgramKey,
    pub render_state: RenderState,
    pub uniforms: SensorUniforms,
}

/// Everything about a command that survives between frames
///
/// Buffers and uniforms are looked up at emission time so a geometry rebuild
/// never leaves a template pointing at a released buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandTemplate {
    pub part: VolumePart,
    pub face: Face,
    pub pass: Pass,
    pub program: ProgramKey,
    pub render_state: RenderState,
    /// -1 for back faces
    pub normal_direction: f32,
    pub kind: u32,
}

impl CommandTemplate {
    pub fn is_line(&self) -> bool {
        self.kind == KIND_LINE
    }
}

/// Projection the host is currently rendering with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneMode {
    #[default]
    Scene3D,
    Scene2D,
    ColumbusView,
    Morphing,
}

/// Which passes the host will execute this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Passes {
    pub render: bool,
}

impl Default for Passes {
    fn default() -> Self {
        Self { render: true }
    }
}

/// Per-frame context passed to every primitive update
#[derive(Clone, Debug)]
pub struct FrameState {
    pub time: SimTime,
    pub mode: SceneMode,
    pub passes: Passes,
    pub view_projection: [[f32; 4]; 4],
    pub command_list: Vec<DrawCommand>,
    pub frame_number: u64,
}

impl FrameState {
    pub fn new(time: SimTime) -> Self {
        Self {
            time,
            mode: SceneMode::Scene3D,
            passes: Passes::default(),
            view_projection: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            command_list: Vec::new(),
            frame_number: 0,
        }
    }

    pub fn with_mode(mut self, mode: SceneMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_view_projection(mut self, view_projection: [[f32; 4]; 4]) -> Self {
        self.view_projection = view_projection;
        self
    }

    /// Start the next frame at `time` with an empty command list
    pub fn begin(&mut self, time: SimTime) {
        self.time = time;
        self.command_list.clear();
        self.frame_number += 1;
    }

    /// Commands queued for one pass, in submission order
    pub fn commands_in(&self, pass: Pass) -> impl Iterator<Item = &DrawCommand> {
        self.command_list.iter().filter(move |c| c.pass == pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorvol_core::time::parse_time;

    #[test]
    fn test_part_topology() {
        let lines: Vec<_> = VolumePart::ALL.iter().filter(|p| p.is_line()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(VolumePart::DomeLines.topology(), Topology::LineList);
        assert_eq!(VolumePart::ScanPlane.topology(), Topology::TriangleList);
    }

    #[test]
    fn test_frame_begin_clears_commands() {
        let t = parse_time("2024-01-01T00:00:00Z").unwrap();
        let mut frame = FrameState::new(t);
        assert_eq!(frame.mode, SceneMode::Scene3D);
        assert!(frame.passes.render);
        frame.begin(t);
        assert_eq!(frame.frame_number, 1);
        assert!(frame.command_list.is_empty());
    }
}
