//! Render device abstraction
//!
//! Volumes only ever hold keys into a device; the device owns the actual
//! buffers and compiled programs. [`HeadlessDevice`] keeps everything on the
//! CPU and records what was asked of it, which makes it both the fallback
//! backend and the test double.

use slotmap::{new_key_type, SlotMap};

use crate::command::{DrawCommand, Pass};
use crate::error::RenderError;
use crate::pipeline::{ProgramSource, VolumeVertex};

new_key_type! {
    /// Key of a vertex buffer owned by a device
    pub struct BufferKey;
    /// Key of a compiled program owned by a device
    pub struct ProgramKey;
}

/// Counts reported by [`RenderDevice::submit`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub opaque: usize,
    pub translucent: usize,
    pub vertices: u64,
}

impl SubmitStats {
    pub fn commands(&self) -> usize {
        self.opaque + self.translucent
    }

    pub(crate) fn record(&mut self, command: &DrawCommand) {
        match command.pass {
            Pass::Opaque => self.opaque += 1,
            Pass::Translucent => self.translucent += 1,
        }
        self.vertices += command.vertex_count as u64;
    }
}

/// GPU operations needed by sensor volumes
pub trait RenderDevice {
    /// Upload vertices into a new static buffer
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[VolumeVertex],
    ) -> Result<BufferKey, RenderError>;

    /// Release a buffer; unknown keys are ignored
    fn destroy_buffer(&mut self, key: BufferKey);

    /// Compile and link a program
    fn compile_program(
        &mut self,
        label: &str,
        source: &ProgramSource,
    ) -> Result<ProgramKey, RenderError>;

    /// Execute a frame's commands, opaque pass first
    fn submit(&mut self, commands: &[DrawCommand]) -> Result<SubmitStats, RenderError>;

    /// Number of buffers created and not yet destroyed
    fn live_buffer_count(&self) -> usize;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: String,
    vertices: Vec<VolumeVertex>,
}

/// CPU-only device that stores uploads and validates submissions
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    buffers: SlotMap<BufferKey, HeadlessBuffer>,
    programs: SlotMap<ProgramKey, String>,
    buffers_created: usize,
    buffers_destroyed: usize,
    fail_compilation: bool,
    last_submit: SubmitStats,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`RenderDevice::compile_program`] fail
    pub fn set_fail_compilation(&mut self, fail: bool) {
        self.fail_compilation = fail;
    }

    /// Vertices uploaded to a live buffer
    pub fn buffer_contents(&self, key: BufferKey) -> Option<&[VolumeVertex]> {
        self.buffers.get(key).map(|b| b.vertices.as_slice())
    }

    pub fn buffer_label(&self, key: BufferKey) -> Option<&str> {
        self.buffers.get(key).map(|b| b.label.as_str())
    }

    pub fn contains_buffer(&self, key: BufferKey) -> bool {
        self.buffers.contains_key(key)
    }

    pub fn contains_program(&self, key: ProgramKey) -> bool {
        self.programs.contains_key(key)
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    pub fn buffers_destroyed(&self) -> usize {
        self.buffers_destroyed
    }

    pub fn programs_compiled(&self) -> usize {
        self.programs.len()
    }

    pub fn last_submit(&self) -> SubmitStats {
        self.last_submit
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[VolumeVertex],
    ) -> Result<BufferKey, RenderError> {
        self.buffers_created += 1;
        Ok(self.buffers.insert(HeadlessBuffer {
            label: label.to_string(),
            vertices: vertices.to_vec(),
        }))
    }

    fn destroy_buffer(&mut self, key: BufferKey) {
        if self.buffers.remove(key).is_some() {
            self.buffers_destroyed += 1;
        }
    }

    fn compile_program(
        &mut self,
        label: &str,
        source: &ProgramSource,
    ) -> Result<ProgramKey, RenderError> {
        if self.fail_compilation {
            let message = format!("{}: compilation disabled", label);
            return Err(RenderError::ShaderCompilation(message));
        }
        if source.vertex.is_empty() || source.fragment.is_empty() {
            return Err(RenderError::ShaderCompilation(format!("{}: empty stage", label)));
        }
        Ok(self.programs.insert(label.to_string()))
    }

    fn submit(&mut self, commands: &[DrawCommand]) -> Result<SubmitStats, RenderError> {
        let mut stats = SubmitStats::default();
        for command in commands {
            let part = command.part.label();
            let buffer = self.buffers.get(command.buffer).ok_or_else(|| {
                RenderError::Submission(format!("{} references a released buffer", part))
            })?;
            if !self.programs.contains_key(command.program) {
                let message = format!("{} references an unknown program", part);
                return Err(RenderError::Submission(message));
            }
            if command.vertex_count as usize > buffer.vertices.len() {
                return Err(RenderError::Submission(format!(
                    "{} draws {} vertices from a buffer of {}",
                    part,
                    command.vertex_count,
                    buffer.vertices.len()
                )));
            }
            stats.record(command);
        }
        self.last_submit = stats;
        Ok(stats)
    }

    fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn backend_name(&self) -> &'static str {
        "headless"
    }
}
