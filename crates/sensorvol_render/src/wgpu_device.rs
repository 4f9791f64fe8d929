//! wgpu render device
//!
//! Renders submitted commands into an offscreen color and depth target.
//! Pipelines are created lazily per (program, render state, topology) and
//! kept for the lifetime of the device.

use std::collections::HashMap;

use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use crate::command::{DrawCommand, Topology};
use crate::device::{BufferKey, ProgramKey, RenderDevice, SubmitStats};
use crate::error::RenderError;
use crate::pipeline::{ProgramSource, RenderState, VolumeVertex, FRAGMENT_ENTRY, VERTEX_ENTRY};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct CompiledProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramKey,
    state: RenderState,
    topology: Topology,
}

/// Offscreen wgpu backend
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    buffers: SlotMap<BufferKey, GpuBuffer>,
    programs: SlotMap<ProgramKey, CompiledProgram>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl WgpuDevice {
    /// Create a device without a surface, rendering into a `width` x `height` target
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DeviceUnavailable`] if no adapter or device can
    /// be obtained; callers fall back to the headless device.
    pub fn new_headless(
        power_preference: wgpu::PowerPreference,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::DeviceUnavailable("no compatible adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Sensor Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::DeviceUnavailable(e.to_string()))?;

        let adapter_name = adapter.get_info().name;
        log::info!("Using adapter {} ({}x{} offscreen)", adapter_name, width, height);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sensor Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sensor Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let target = |label: &str, format: wgpu::TextureFormat| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let color_view = target("Sensor Color Target", COLOR_FORMAT);
        let depth_view = target("Sensor Depth Target", DEPTH_FORMAT);

        Ok(Self {
            device,
            queue,
            adapter_name,
            bind_group_layout,
            pipeline_layout,
            color_view,
            depth_view,
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            pipelines: HashMap::new(),
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn pop_validation_error(&self) -> Option<wgpu::Error> {
        pollster::block_on(self.device.pop_error_scope())
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> Result<(), RenderError> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let program = self
            .programs
            .get(key.program)
            .ok_or_else(|| {
                RenderError::Submission("command references an unknown program".into())
            })?;

        // culling has no effect on lines
        let cull_mode = match key.topology {
            Topology::LineList => None,
            Topology::TriangleList => key.state.cull_mode(),
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sensor Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[VolumeVertex::buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: key.state.blend_state(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.state.depth_write,
                depth_compare: key.state.depth_compare(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = self.pop_validation_error() {
            return Err(RenderError::ShaderCompilation(format!(
                "pipeline creation failed: {}",
                error
            )));
        }

        log::debug!("Created pipeline for {:?}", key);
        self.pipelines.insert(key, pipeline);
        Ok(())
    }
}

impl RenderDevice for WgpuDevice {
    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[VolumeVertex],
    ) -> Result<BufferKey, RenderError> {
        if vertices.is_empty() {
            return Err(RenderError::BufferCreation(format!("{}: no vertices", label)));
        }
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::BufferCreation(format!("{}: {}", label, error)));
        }
        Ok(self.buffers.insert(GpuBuffer { buffer, vertex_count: vertices.len() as u32 }))
    }

    fn destroy_buffer(&mut self, key: BufferKey) {
        if let Some(gpu) = self.buffers.remove(key) {
            gpu.buffer.destroy();
        }
    }

    fn compile_program(
        &mut self,
        label: &str,
        source: &ProgramSource,
    ) -> Result<ProgramKey, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.vertex.as_str().into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.fragment.as_str().into()),
        });
        if let Some(error) = self.pop_validation_error() {
            return Err(RenderError::ShaderCompilation(format!("{}: {}", label, error)));
        }
        Ok(self.programs.insert(CompiledProgram { vertex, fragment }))
    }

    fn submit(&mut self, commands: &[DrawCommand]) -> Result<SubmitStats, RenderError> {
        let mut ordered: Vec<&DrawCommand> = commands.iter().collect();
        ordered.sort_by_key(|c| c.pass);

        let mut stats = SubmitStats::default();
        let mut draws = Vec::with_capacity(ordered.len());
        for command in ordered {
            let key = PipelineKey {
                program: command.program,
                state: command.render_state,
                topology: command.topology,
            };
            self.ensure_pipeline(key)?;

            let gpu = self.buffers.get(command.buffer).ok_or_else(|| {
                let part = command.part.label();
                RenderError::Submission(format!("{} references a released buffer", part))
            })?;
            let vertex_count = command.vertex_count.min(gpu.vertex_count);

            let uniforms = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sensor Uniform Buffer"),
                contents: bytemuck::bytes_of(&command.uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sensor Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                }],
            });

            stats.record(command);
            draws.push((key, command.buffer, vertex_count, bind_group));
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sensor Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sensor Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (key, buffer, vertex_count, bind_group) in &draws {
                let (Some(pipeline), Some(gpu)) =
                    (self.pipelines.get(key), self.buffers.get(*buffer))
                else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_vertex_buffer(0, gpu.buffer.slice(..));
                pass.draw(0..*vertex_count, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));

        log::trace!("Submitted {} commands", stats.commands());
        Ok(stats)
    }

    fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn backend_name(&self) -> &'static str {
        "wgpu"
    }
}
