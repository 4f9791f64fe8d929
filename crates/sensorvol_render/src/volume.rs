//! Rectangular pyramid sensor volume
//!
//! The volume owns one vertex buffer per enabled part, the programs and
//! render states for its two materials, and a list of command templates.
//! Each [`update`](RectangularPyramidSensorVolume::update) compares the
//! public inputs against the values the caches were built from and rebuilds
//! only what is stale:
//!
//! | Input changed                                   | Rebuilt                |
//! |-------------------------------------------------|------------------------|
//! | half-angles, `slice`, enabled parts, scan mode  | vertex buffers         |
//! | model matrix, radius                            | placement, bounds      |
//! | occlusion flag, material identity/translucency  | render states          |
//! | material identity, scan plane toggle            | programs               |
//! | render states or programs                       | command templates      |

use std::sync::Arc;

use bitflags::bitflags;
use sensorvol_core::{Color, Material, MaterialId, ScanPlaneMode};
use sensorvol_math::{mat4, BoundingSphere, Mat4, Vec3};

use crate::command::{CommandTemplate, DrawCommand, Face, FrameState, Pass, SceneMode, VolumePart};
use crate::device::{BufferKey, RenderDevice};
use crate::error::{Axis, RenderError};
use crate::geometry::{
    build_sector_loop, build_unit_arcs, scan_plane_fan, sector_line_vertices, segment_line_vertices,
    triangulate_fan, EllipsoidMesh, EllipsoidMeshProvider, DOME_PARTITIONS,
};
use crate::pipeline::{
    build_render_states, ProgramHandle, ProgramSource, RenderStates, SensorUniforms, ShaderCache,
    VolumeVertex, KIND_LINE, KIND_SURFACE,
};
use crate::scan_plane::{sweep, ScanClock, ScanPlaneState};

/// Default tessellation of the lateral arcs
pub const DEFAULT_SLICE: usize = 32;
/// Default intersection line width for directly constructed volumes
pub const DEFAULT_INTERSECTION_WIDTH: f64 = 5.0;
/// Default seconds per scan plane sweep
pub const DEFAULT_SCAN_PLANE_RATE: f64 = 10.0;
/// Largest radius used for drawing; an unbounded volume is drawn at this scale
pub const MAX_RENDER_RADIUS: f64 = 1.0e10;

bitflags! {
    /// Caches rebuilt during the last update
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RebuildFlags: u8 {
        /// Vertex buffers were re-uploaded
        const GEOMETRY = 1 << 0;
        /// Computed model matrix and bounding sphere were recomputed
        const PLACEMENT = 1 << 1;
        /// Render states were rebuilt
        const RENDER_STATE = 1 << 2;
        /// Programs were fetched from the shader cache
        const SHADER = 1 << 3;
        /// Command templates were rebuilt
        const COMMANDS = 1 << 4;
    }
}

bitflags! {
    /// Set of enabled renderable parts
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PartMask: u8 {
        const LATERAL_SURFACES = 1 << 0;
        const SECTOR_LINES = 1 << 1;
        const SECTOR_SEGMENT_LINES = 1 << 2;
        const DOME_SURFACES = 1 << 3;
        const DOME_LINES = 1 << 4;
        const SCAN_PLANE = 1 << 5;
    }
}

impl PartMask {
    pub fn of(part: VolumePart) -> Self {
        match part {
            VolumePart::LateralSurfaces => PartMask::LATERAL_SURFACES,
            VolumePart::SectorLines => PartMask::SECTOR_LINES,
            VolumePart::SectorSegmentLines => PartMask::SECTOR_SEGMENT_LINES,
            VolumePart::DomeSurfaces => PartMask::DOME_SURFACES,
            VolumePart::DomeLines => PartMask::DOME_LINES,
            VolumePart::ScanPlane => PartMask::SCAN_PLANE,
        }
    }

    pub fn has(self, part: VolumePart) -> bool {
        self.contains(Self::of(part))
    }
}

/// Shared per-frame collaborators of every volume
pub struct FrameResources<'a> {
    pub device: &'a mut dyn RenderDevice,
    pub shaders: &'a mut ShaderCache,
    pub ellipsoid: &'a dyn EllipsoidMeshProvider,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct GeometryKey {
    x_half_angle: f64,
    y_half_angle: f64,
    slice: usize,
    parts: PartMask,
    scan_plane_mode: ScanPlaneMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RenderStateKey {
    show_through_ellipsoid: bool,
    lateral: (MaterialId, bool),
    dome: (MaterialId, bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ShaderKey {
    lateral: MaterialId,
    dome: MaterialId,
    scan_plane: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PartBuffer {
    key: BufferKey,
    vertex_count: u32,
}

#[derive(Clone, Copy, Debug)]
struct Programs {
    lateral: ProgramHandle,
    dome: ProgramHandle,
    scan_plane: Option<ProgramHandle>,
}

/// One rectangular pyramid sensor: inputs are public fields, caches are private
#[derive(Debug)]
pub struct RectangularPyramidSensorVolume {
    pub show: bool,
    pub slice: usize,
    pub x_half_angle: f64,
    pub y_half_angle: f64,
    pub radius: f64,
    pub model_matrix: Mat4,

    pub show_lateral_surfaces: bool,
    pub show_sector_lines: bool,
    pub show_sector_segment_lines: bool,
    pub show_dome_surfaces: bool,
    pub show_dome_lines: bool,
    pub show_scan_plane: bool,
    pub show_intersection: bool,
    pub show_through_ellipsoid: bool,

    pub line_color: Color,
    pub intersection_color: Color,
    pub scan_plane_color: Color,
    pub intersection_width: f64,

    pub lateral_surface_material: Material,
    pub dome_surface_material: Material,

    pub scan_plane_mode: ScanPlaneMode,
    /// Seconds per full sweep
    pub scan_plane_rate: f64,

    /// Owner tag copied onto every emitted command
    pub id: Option<Arc<str>>,

    geometry_key: Option<GeometryKey>,
    placement_key: Option<(Mat4, f64)>,
    render_state_key: Option<RenderStateKey>,
    shader_key: Option<ShaderKey>,

    buffers: [Option<PartBuffer>; 6],
    lateral_states: Option<RenderStates>,
    dome_states: Option<RenderStates>,
    programs: Option<Programs>,
    templates: Vec<CommandTemplate>,

    computed_model_matrix: Mat4,
    computed_scan_plane_model_matrix: Mat4,
    bounding_sphere: BoundingSphere,
    bounding_sphere_wc: BoundingSphere,
    scan_plane_state: Option<ScanPlaneState>,
    scan_clock: ScanClock,
    last_rebuild: RebuildFlags,
}

impl Default for RectangularPyramidSensorVolume {
    fn default() -> Self {
        Self::new()
    }
}

fn part_index(part: VolumePart) -> usize {
    match part {
        VolumePart::LateralSurfaces => 0,
        VolumePart::SectorLines => 1,
        VolumePart::SectorSegmentLines => 2,
        VolumePart::DomeSurfaces => 3,
        VolumePart::DomeLines => 4,
        VolumePart::ScanPlane => 5,
    }
}

fn uses_dome_material(part: VolumePart) -> bool {
    part == VolumePart::DomeSurfaces
}

fn expand_indexed(mesh: &EllipsoidMesh, as_lines: bool) -> Vec<VolumeVertex> {
    mesh.indices
        .iter()
        .filter_map(|&i| mesh.positions.get(i as usize))
        .map(|p| {
            if as_lines {
                VolumeVertex::line(p.to_f32_array())
            } else {
                VolumeVertex::new(p.to_f32_array(), p.to_f32_array())
            }
        })
        .collect()
}

impl RectangularPyramidSensorVolume {
    /// Volume with construction defaults: every part shown except
    /// occlusion pass-through, white colors, translucent red materials
    pub fn new() -> Self {
        Self {
            show: true,
            slice: DEFAULT_SLICE,
            x_half_angle: 0.0,
            y_half_angle: 0.0,
            radius: f64::INFINITY,
            model_matrix: mat4::IDENTITY,

            show_lateral_surfaces: true,
            show_sector_lines: true,
            show_sector_segment_lines: true,
            show_dome_surfaces: true,
            show_dome_lines: true,
            show_scan_plane: true,
            show_intersection: true,
            show_through_ellipsoid: false,

            line_color: Color::WHITE,
            intersection_color: Color::WHITE,
            scan_plane_color: Color::WHITE,
            intersection_width: DEFAULT_INTERSECTION_WIDTH,

            lateral_surface_material: Material::default(),
            dome_surface_material: Material::default(),

            scan_plane_mode: ScanPlaneMode::Horizontal,
            scan_plane_rate: DEFAULT_SCAN_PLANE_RATE,

            id: None,

            geometry_key: None,
            placement_key: None,
            render_state_key: None,
            shader_key: None,

            buffers: [None; 6],
            lateral_states: None,
            dome_states: None,
            programs: None,
            templates: Vec::new(),

            computed_model_matrix: mat4::IDENTITY,
            computed_scan_plane_model_matrix: mat4::IDENTITY,
            bounding_sphere: BoundingSphere::default(),
            bounding_sphere_wc: BoundingSphere::default(),
            scan_plane_state: None,
            scan_clock: ScanClock::new(),
            last_rebuild: RebuildFlags::empty(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_half_angles(mut self, x_half_angle: f64, y_half_angle: f64) -> Self {
        self.x_half_angle = x_half_angle;
        self.y_half_angle = y_half_angle;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_model_matrix(mut self, model_matrix: Mat4) -> Self {
        self.model_matrix = model_matrix;
        self
    }

    /// Parts whose show flag is set
    pub fn enabled_parts(&self) -> PartMask {
        let mut mask = PartMask::empty();
        mask.set(PartMask::LATERAL_SURFACES, self.show_lateral_surfaces);
        mask.set(PartMask::SECTOR_LINES, self.show_sector_lines);
        mask.set(PartMask::SECTOR_SEGMENT_LINES, self.show_sector_segment_lines);
        mask.set(PartMask::DOME_SURFACES, self.show_dome_surfaces);
        mask.set(PartMask::DOME_LINES, self.show_dome_lines);
        mask.set(PartMask::SCAN_PLANE, self.show_scan_plane);
        mask
    }

    /// Caches rebuilt by the most recent [`update`](Self::update)
    pub fn last_rebuild(&self) -> RebuildFlags {
        self.last_rebuild
    }

    /// Device buffer currently holding a part's vertices
    pub fn buffer(&self, part: VolumePart) -> Option<BufferKey> {
        self.buffers[part_index(part)].map(|b| b.key)
    }

    pub fn buffer_keys(&self) -> impl Iterator<Item = BufferKey> + '_ {
        self.buffers.iter().flatten().map(|b| b.key)
    }

    pub fn command_templates(&self) -> &[CommandTemplate] {
        &self.templates
    }

    pub fn computed_model_matrix(&self) -> Mat4 {
        self.computed_model_matrix
    }

    pub fn computed_scan_plane_model_matrix(&self) -> Mat4 {
        self.computed_scan_plane_model_matrix
    }

    /// Bounds in world space
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere_wc
    }

    pub fn scan_plane_state(&self) -> Option<ScanPlaneState> {
        self.scan_plane_state
    }

    /// Radius the volume is drawn and bounded at
    pub fn render_radius(&self) -> f64 {
        self.radius.min(MAX_RENDER_RADIUS)
    }

    /// Check inputs without touching any cache
    fn validate(&self) -> Result<(), RenderError> {
        // written as negated comparisons so NaN is rejected too
        if !(self.x_half_angle >= 0.0) {
            return Err(RenderError::NegativeHalfAngle { axis: Axis::X, value: self.x_half_angle });
        }
        if !(self.y_half_angle >= 0.0) {
            return Err(RenderError::NegativeHalfAngle { axis: Axis::Y, value: self.y_half_angle });
        }
        if !(self.radius >= 0.0) {
            return Err(RenderError::NegativeRadius(self.radius));
        }
        Ok(())
    }

    /// Advance one frame: rebuild stale caches and append draw commands
    ///
    /// # Errors
    ///
    /// Negative half-angles or radius are rejected before anything is
    /// mutated. Device failures from buffer creation or program compilation
    /// are propagated.
    pub fn update(
        &mut self,
        frame: &mut FrameState,
        resources: &mut FrameResources<'_>,
    ) -> Result<(), RenderError> {
        self.last_rebuild = RebuildFlags::empty();
        if !self.show || frame.mode != SceneMode::Scene3D {
            return Ok(());
        }

        self.validate()?;
        if self.x_half_angle == 0.0 || self.y_half_angle == 0.0 {
            return Ok(());
        }

        let mut rebuilt = RebuildFlags::empty();

        let geometry_key = GeometryKey {
            x_half_angle: self.x_half_angle,
            y_half_angle: self.y_half_angle,
            slice: self.slice,
            parts: self.enabled_parts(),
            scan_plane_mode: self.scan_plane_mode,
        };
        if self.geometry_key != Some(geometry_key) {
            self.rebuild_geometry(&geometry_key, resources)?;
            self.geometry_key = Some(geometry_key);
            rebuilt |= RebuildFlags::GEOMETRY;
        }

        let placement_key = (self.model_matrix, self.radius);
        if self.placement_key != Some(placement_key) {
            let radius = self.render_radius();
            self.computed_model_matrix = mat4::multiply_by_uniform_scale(self.model_matrix, radius);
            self.bounding_sphere = BoundingSphere::new(Vec3::ZERO, radius);
            self.bounding_sphere_wc = self.bounding_sphere.transform(self.model_matrix);
            self.placement_key = Some(placement_key);
            rebuilt |= RebuildFlags::PLACEMENT;
        }

        let render_state_key = RenderStateKey {
            show_through_ellipsoid: self.show_through_ellipsoid,
            lateral: (
                self.lateral_surface_material.id(),
                self.lateral_surface_material.is_translucent(),
            ),
            dome: (
                self.dome_surface_material.id(),
                self.dome_surface_material.is_translucent(),
            ),
        };
        if self.render_state_key != Some(render_state_key) {
            let show_through = self.show_through_ellipsoid;
            let (lateral_translucent, dome_translucent) =
                (render_state_key.lateral.1, render_state_key.dome.1);
            self.lateral_states = Some(build_render_states(lateral_translucent, show_through));
            self.dome_states = Some(build_render_states(dome_translucent, show_through));
            self.render_state_key = Some(render_state_key);
            rebuilt |= RebuildFlags::RENDER_STATE;
        }

        let shader_key = ShaderKey {
            lateral: self.lateral_surface_material.id(),
            dome: self.dome_surface_material.id(),
            scan_plane: self.show_scan_plane,
        };
        if self.shader_key != Some(shader_key) {
            self.programs = Some(self.fetch_programs(resources)?);
            self.shader_key = Some(shader_key);
            rebuilt |= RebuildFlags::SHADER;
        }

        if rebuilt.intersects(RebuildFlags::RENDER_STATE | RebuildFlags::SHADER) {
            self.rebuild_templates();
            rebuilt |= RebuildFlags::COMMANDS;
        }

        if self.show_scan_plane {
            let elapsed = self.scan_clock.elapsed(frame.time);
            let state = sweep(
                self.scan_plane_mode,
                self.scan_plane_rate,
                elapsed,
                self.x_half_angle,
                self.y_half_angle,
            );
            let rotated = mat4::mul(self.model_matrix, mat4::from_mat3(state.rotation));
            self.computed_scan_plane_model_matrix =
                mat4::multiply_by_uniform_scale(rotated, self.render_radius());
            self.scan_plane_state = Some(state);
        }

        if !rebuilt.is_empty() {
            log::debug!("Volume {:?} rebuilt {:?}", self.id, rebuilt);
        }
        self.last_rebuild = rebuilt;

        if frame.passes.render {
            self.emit(frame);
        }
        Ok(())
    }

    fn part_vertices(
        &self,
        part: VolumePart,
        key: &GeometryKey,
        ellipsoid: &dyn EllipsoidMeshProvider,
    ) -> Vec<VolumeVertex> {
        let loops = || {
            let arcs = build_unit_arcs(key.x_half_angle, key.y_half_angle, key.slice);
            build_sector_loop(key.x_half_angle, key.y_half_angle, &arcs)
        };
        match part {
            VolumePart::LateralSurfaces => triangulate_fan(&loops()),
            VolumePart::SectorLines => sector_line_vertices(&loops()),
            VolumePart::SectorSegmentLines => segment_line_vertices(&loops()),
            VolumePart::DomeSurfaces => {
                let mesh = ellipsoid.build_ellipsoid_mesh(DOME_PARTITIONS, DOME_PARTITIONS);
                expand_indexed(&mesh, false)
            }
            VolumePart::DomeLines => {
                let outline = ellipsoid.build_ellipsoid_outline(DOME_PARTITIONS, DOME_PARTITIONS);
                expand_indexed(&outline, true)
            }
            VolumePart::ScanPlane => scan_plane_fan(key.scan_plane_mode, key.slice),
        }
    }

    /// Upload every enabled part, then release the previous buffers.
    ///
    /// On failure the buffers created so far are released and the old ones
    /// stay in place.
    fn rebuild_geometry(
        &mut self,
        key: &GeometryKey,
        resources: &mut FrameResources<'_>,
    ) -> Result<(), RenderError> {
        let mut fresh: [Option<PartBuffer>; 6] = [None; 6];

        for part in VolumePart::ALL {
            if !key.parts.has(part) {
                continue;
            }
            let vertices = self.part_vertices(part, key, resources.ellipsoid);
            if vertices.is_empty() {
                continue;
            }
            match resources.device.create_vertex_buffer(part.label(), &vertices) {
                Ok(buffer) => {
                    fresh[part_index(part)] = Some(PartBuffer {
                        key: buffer,
                        vertex_count: vertices.len() as u32,
                    });
                }
                Err(e) => {
                    for created in fresh.iter().flatten() {
                        resources.device.destroy_buffer(created.key);
                    }
                    return Err(e);
                }
            }
        }

        for old in std::mem::replace(&mut self.buffers, fresh).iter().flatten() {
            resources.device.destroy_buffer(old.key);
        }
        Ok(())
    }

    fn fetch_programs(&self, resources: &mut FrameResources<'_>) -> Result<Programs, RenderError> {
        let lateral = resources.shaders.compile_or_fetch(
            &mut *resources.device,
            "Sensor Lateral Program",
            &ProgramSource::sensor(&self.lateral_surface_material),
        )?;
        let dome = resources.shaders.compile_or_fetch(
            &mut *resources.device,
            "Sensor Dome Program",
            &ProgramSource::sensor(&self.dome_surface_material),
        )?;
        let scan_plane = if self.show_scan_plane {
            Some(resources.shaders.compile_or_fetch(
                &mut *resources.device,
                "Sensor Scan Plane Program",
                &ProgramSource::scan_plane(&self.lateral_surface_material),
            )?)
        } else {
            None
        };
        Ok(Programs { lateral, dome, scan_plane })
    }

    fn rebuild_templates(&mut self) {
        self.templates.clear();
        let (Some(programs), Some(lateral_states), Some(dome_states)) =
            (self.programs, self.lateral_states, self.dome_states)
        else {
            return;
        };

        for part in VolumePart::ALL {
            let (program, states, material) = match part {
                VolumePart::ScanPlane => match programs.scan_plane {
                    Some(program) => (program, lateral_states, &self.lateral_surface_material),
                    None => continue,
                },
                p if uses_dome_material(p) => {
                    (programs.dome, dome_states, &self.dome_surface_material)
                }
                _ => (programs.lateral, lateral_states, &self.lateral_surface_material),
            };
            let pass = if material.is_translucent() { Pass::Translucent } else { Pass::Opaque };

            if part.is_line() {
                self.templates.push(CommandTemplate {
                    part,
                    face: Face::Front,
                    pass,
                    program: program.key(),
                    render_state: states.front,
                    normal_direction: 1.0,
                    kind: KIND_LINE,
                });
                continue;
            }

            if let Some(back) = states.back {
                self.templates.push(CommandTemplate {
                    part,
                    face: Face::Back,
                    pass,
                    program: program.key(),
                    render_state: back,
                    normal_direction: -1.0,
                    kind: KIND_SURFACE,
                });
            }
            self.templates.push(CommandTemplate {
                part,
                face: Face::Front,
                pass,
                program: program.key(),
                render_state: states.front,
                normal_direction: 1.0,
                kind: KIND_SURFACE,
            });
        }
    }

    /// Uniform snapshot for one template at the current frame
    fn uniforms(&self, template: &CommandTemplate, frame: &FrameState) -> SensorUniforms {
        let is_scan_plane = template.part == VolumePart::ScanPlane;
        let scan_plane_state = self.scan_plane_state.filter(|_| is_scan_plane);
        let (model, x_half_angle, y_half_angle, material_color) = match scan_plane_state {
            Some(state) => (
                self.computed_scan_plane_model_matrix,
                state.x_half_angle,
                state.y_half_angle,
                self.scan_plane_color,
            ),
            _ => {
                let material = if uses_dome_material(template.part) {
                    &self.dome_surface_material
                } else {
                    &self.lateral_surface_material
                };
                (
                    self.computed_model_matrix,
                    self.x_half_angle,
                    self.y_half_angle,
                    material.color_uniform(),
                )
            }
        };

        SensorUniforms {
            view_projection: frame.view_projection,
            model: mat4::to_f32(model),
            line_color: self.line_color.to_array(),
            intersection_color: self.intersection_color.to_array(),
            material_color: material_color.to_array(),
            x_half_angle: x_half_angle as f32,
            y_half_angle: y_half_angle as f32,
            radius: self.render_radius() as f32,
            intersection_width: self.intersection_width as f32,
            normal_direction: template.normal_direction,
            kind: template.kind,
            show_intersection: self.show_intersection as u32,
            show_through_ellipsoid: self.show_through_ellipsoid as u32,
        }
    }

    fn emit(&self, frame: &mut FrameState) {
        let parts = self.enabled_parts();
        let mut emitted = 0usize;
        for template in &self.templates {
            if !parts.has(template.part) {
                continue;
            }
            let Some(buffer) = self.buffers[part_index(template.part)] else {
                continue;
            };
            let command = DrawCommand {
                owner: self.id.clone(),
                part: template.part,
                face: template.face,
                pass: template.pass,
                topology: template.part.topology(),
                buffer: buffer.key,
                vertex_count: buffer.vertex_count,
                program: template.program,
                render_state: template.render_state,
                uniforms: self.uniforms(template, frame),
            };
            frame.command_list.push(command);
            emitted += 1;
        }
        log::trace!("Volume {:?} emitted {} commands", self.id, emitted);
    }

    /// Release every buffer this volume owns
    pub fn destroy(mut self, device: &mut dyn RenderDevice) {
        let mut released = 0usize;
        for buffer in self.buffers.iter_mut().filter_map(Option::take) {
            device.destroy_buffer(buffer.key);
            released += 1;
        }
        log::info!("Destroyed sensor volume {:?} ({} buffers released)", self.id, released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::geometry::UnitSphereMeshProvider;
    use sensorvol_core::time::{add_seconds, parse_time};
    use sensorvol_core::SimTime;
    use sensorvol_math::mat3;

    const EPSILON: f64 = 1e-9;

    struct Harness {
        device: HeadlessDevice,
        shaders: ShaderCache,
        frame: FrameState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                device: HeadlessDevice::new(),
                shaders: ShaderCache::new(),
                frame: FrameState::new(t0()),
            }
        }

        fn update(
            &mut self,
            volume: &mut RectangularPyramidSensorVolume,
        ) -> Result<(), RenderError> {
            self.update_at(volume, self.frame.time)
        }

        fn update_at(
            &mut self,
            volume: &mut RectangularPyramidSensorVolume,
            time: SimTime,
        ) -> Result<(), RenderError> {
            self.frame.begin(time);
            let mut resources = FrameResources {
                device: &mut self.device,
                shaders: &mut self.shaders,
                ellipsoid: &UnitSphereMeshProvider,
            };
            volume.update(&mut self.frame, &mut resources)
        }

        /// Commands queued this frame for `part`, in emission order
        fn commands(&self, part: VolumePart) -> Vec<&DrawCommand> {
            self.frame.command_list.iter().filter(|c| c.part == part).collect()
        }
    }

    fn t0() -> SimTime {
        parse_time("2024-01-01T00:00:00Z").unwrap()
    }

    fn volume() -> RectangularPyramidSensorVolume {
        RectangularPyramidSensorVolume::new()
            .with_id("sensor")
            .with_half_angles(0.4, 0.3)
            .with_radius(1000.0)
    }

    #[test]
    fn test_construction_defaults() {
        let v = RectangularPyramidSensorVolume::new();
        assert!(v.show);
        assert_eq!(v.slice, 32);
        assert_eq!(v.radius, f64::INFINITY);
        assert_eq!(v.intersection_width, 5.0);
        assert_eq!(v.scan_plane_rate, 10.0);
        assert!(!v.show_through_ellipsoid);
        assert_eq!(v.enabled_parts(), PartMask::all());
        assert!(v.lateral_surface_material.is_translucent());
        assert_ne!(v.lateral_surface_material.id(), v.dome_surface_material.id());
    }

    #[test]
    fn test_first_update_builds_everything() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        assert_eq!(v.last_rebuild(), RebuildFlags::all());
        assert_eq!(h.device.live_buffer_count(), 6);
        // two translucent surfaces and the scan plane are double-sided, three line parts
        assert_eq!(h.frame.command_list.len(), 3 * 2 + 3);
        assert!(h.frame.command_list.iter().all(|c| c.pass == Pass::Translucent));
        assert!(h.frame.command_list.iter().all(|c| c.owner.as_deref() == Some("sensor")));
        assert!(h.device.submit(&h.frame.command_list).is_ok());
    }

    #[test]
    fn test_second_update_is_idempotent() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();
        let lateral = v.buffer(VolumePart::LateralSurfaces).unwrap();
        let contents = h.device.buffer_contents(lateral).unwrap();
        let bytes: Vec<u8> = bytemuck::cast_slice(contents).to_vec();
        let first_commands = h.frame.command_list.clone();

        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::empty());
        assert_eq!(v.buffer(VolumePart::LateralSurfaces), Some(lateral));
        let again: &[u8] = bytemuck::cast_slice(h.device.buffer_contents(lateral).unwrap());
        assert_eq!(bytes, again);
        assert_eq!(h.frame.command_list, first_commands);
        assert_eq!(h.device.buffers_created(), 6);
    }

    #[test]
    fn test_zero_half_angle_renders_nothing_and_keeps_caches() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();
        let buffers: Vec<_> = v.buffer_keys().collect();

        v.x_half_angle = 0.0;
        h.update(&mut v).unwrap();
        assert!(h.frame.command_list.is_empty());
        assert_eq!(v.last_rebuild(), RebuildFlags::empty());
        assert_eq!(v.buffer_keys().collect::<Vec<_>>(), buffers);
        assert_eq!(h.device.live_buffer_count(), 6);
    }

    #[test]
    fn test_negative_inputs_are_rejected_without_mutation() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();
        let buffers: Vec<_> = v.buffer_keys().collect();
        let model = v.computed_model_matrix();

        v.y_half_angle = -0.1;
        v.slice = 8;
        let err = h.update(&mut v).unwrap_err();
        assert_eq!(err, RenderError::NegativeHalfAngle { axis: Axis::Y, value: -0.1 });
        assert!(err.is_precondition());

        v.y_half_angle = 0.3;
        v.radius = -5.0;
        assert_eq!(h.update(&mut v).unwrap_err(), RenderError::NegativeRadius(-5.0));

        assert_eq!(v.buffer_keys().collect::<Vec<_>>(), buffers);
        assert_eq!(v.computed_model_matrix(), model);
        assert!(h.frame.command_list.is_empty());
    }

    #[test]
    fn test_negative_checked_before_zero_skip() {
        let mut h = Harness::new();
        let mut v = volume();
        v.x_half_angle = 0.0;
        v.radius = -1.0;
        assert!(matches!(h.update(&mut v), Err(RenderError::NegativeRadius(_))));
    }

    #[test]
    fn test_hidden_or_non_3d_short_circuits() {
        let mut h = Harness::new();
        let mut v = volume();
        v.radius = -1.0;
        v.show = false;
        assert!(h.update(&mut v).is_ok());

        v.show = true;
        h.frame.mode = SceneMode::Scene2D;
        assert!(h.update(&mut v).is_ok());
        assert_eq!(h.device.live_buffer_count(), 0);
    }

    #[test]
    fn test_half_angle_change_rebuilds_geometry_only() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();
        let old = v.buffer(VolumePart::LateralSurfaces).unwrap();

        v.x_half_angle = 0.5;
        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::GEOMETRY);
        assert!(!h.device.contains_buffer(old));
        assert_eq!(h.device.live_buffer_count(), 6);
        // emitted commands reference the new buffers
        assert!(h.device.submit(&h.frame.command_list).is_ok());
    }

    #[test]
    fn test_disabling_a_part_drops_its_buffer_and_commands() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        v.show_dome_lines = false;
        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::GEOMETRY);
        assert!(v.buffer(VolumePart::DomeLines).is_none());
        assert!(h.frame.command_list.iter().all(|c| c.part != VolumePart::DomeLines));
        assert_eq!(h.device.live_buffer_count(), 5);
    }

    #[test]
    fn test_placement() {
        let mut h = Harness::new();
        let mut v = volume();
        v.model_matrix = mat4::from_rotation_translation(mat3::IDENTITY, Vec3::new(10.0, 0.0, 0.0));
        h.update(&mut v).unwrap();

        let sphere = v.bounding_sphere();
        assert!(sphere.center.equals_epsilon(Vec3::new(10.0, 0.0, 0.0), EPSILON));
        assert!((sphere.radius - 1000.0).abs() < EPSILON);
        assert!((v.computed_model_matrix()[0][0] - 1000.0).abs() < EPSILON);

        v.radius = 2000.0;
        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::PLACEMENT);
        let lateral = h.commands(VolumePart::LateralSurfaces)[0];
        assert_eq!(lateral.uniforms.radius, 2000.0);
        assert_eq!(lateral.uniforms.model[0][0], 2000.0);
    }

    #[test]
    fn test_unbounded_radius_draws_at_finite_scale() {
        let mut h = Harness::new();
        let mut v = RectangularPyramidSensorVolume::new().with_half_angles(0.4, 0.3);
        assert_eq!(v.radius, f64::INFINITY);
        h.update(&mut v).unwrap();

        let model = v.computed_model_matrix();
        assert!(model.iter().flatten().all(|x| x.is_finite()), "model {:?}", model);
        assert_eq!(model[0][0], MAX_RENDER_RADIUS);
        assert!(v.computed_scan_plane_model_matrix().iter().flatten().all(|x| x.is_finite()));
        assert_eq!(v.bounding_sphere().radius, MAX_RENDER_RADIUS);
        assert!(!h.frame.command_list.is_empty());
        assert!(h.frame.command_list.iter().all(|c| c.uniforms.radius.is_finite()));
    }

    #[test]
    fn test_opaque_material_switch_rebuilds_states_and_commands() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        v.lateral_surface_material = Material::color(Color::RED);
        h.update(&mut v).unwrap();
        assert_eq!(
            v.last_rebuild(),
            RebuildFlags::RENDER_STATE | RebuildFlags::SHADER | RebuildFlags::COMMANDS
        );
        let lateral = h.commands(VolumePart::LateralSurfaces);
        assert_eq!(lateral.len(), 1);
        assert_eq!(lateral[0].pass, Pass::Opaque);
        assert!(lateral[0].render_state.depth_write);
        // the dome keeps its own translucent material
        assert!(h
            .frame
            .command_list
            .iter()
            .filter(|c| c.part == VolumePart::DomeSurfaces)
            .all(|c| c.pass == Pass::Translucent));
        // same composed source, so no new compile
        assert_eq!(h.device.programs_compiled(), 2);
    }

    #[test]
    fn test_material_color_refresh_keeps_caches() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        v.lateral_surface_material.set_color(Color::YELLOW.with_alpha(0.25));
        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::empty());
        let lateral = h.commands(VolumePart::LateralSurfaces)[0];
        assert_eq!(lateral.uniforms.material_color, [1.0, 1.0, 0.0, 0.25]);
    }

    #[test]
    fn test_show_through_rebuilds_render_state() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        v.show_through_ellipsoid = true;
        h.update(&mut v).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::RENDER_STATE | RebuildFlags::COMMANDS);
        assert!(h.frame.command_list.iter().all(|c| !c.render_state.depth_test));
        assert!(h.frame.command_list.iter().all(|c| c.uniforms.show_through_ellipsoid == 1));
    }

    #[test]
    fn test_back_face_commands_flip_normals() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        let lateral = h.commands(VolumePart::LateralSurfaces);
        assert_eq!(lateral.len(), 2);
        assert_eq!(lateral[0].face, Face::Back);
        assert_eq!(lateral[0].uniforms.normal_direction, -1.0);
        assert_eq!(lateral[1].face, Face::Front);
        assert_eq!(lateral[1].uniforms.normal_direction, 1.0);

        let lines = h.commands(VolumePart::SectorLines)[0];
        assert_eq!(lines.uniforms.kind, KIND_LINE);
    }

    #[test]
    fn test_scan_plane_advances_each_frame() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update_at(&mut v, t0()).unwrap();
        let start = v.scan_plane_state().unwrap();
        assert!((start.y_half_angle + 0.3).abs() < EPSILON);

        h.update_at(&mut v, add_seconds(t0(), 5.0)).unwrap();
        assert_eq!(v.last_rebuild(), RebuildFlags::empty());
        let middle = v.scan_plane_state().unwrap();
        assert!(middle.y_half_angle.abs() < EPSILON);

        let scan = h.commands(VolumePart::ScanPlane)[0];
        assert_eq!(scan.uniforms.material_color, Color::WHITE.to_array());
        assert!((scan.uniforms.x_half_angle - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_scan_plane_toggle_rebuilds_programs() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();

        v.show_scan_plane = false;
        h.update(&mut v).unwrap();
        let expected = RebuildFlags::GEOMETRY | RebuildFlags::SHADER | RebuildFlags::COMMANDS;
        assert!(v.last_rebuild().contains(expected));
        assert!(h.frame.command_list.iter().all(|c| c.part != VolumePart::ScanPlane));
    }

    #[test]
    fn test_render_pass_disabled_emits_nothing() {
        let mut h = Harness::new();
        let mut v = volume();
        h.frame.passes.render = false;
        h.update(&mut v).unwrap();
        assert!(h.frame.command_list.is_empty());
        assert_eq!(v.last_rebuild(), RebuildFlags::all());
    }

    #[test]
    fn test_shader_failure_propagates() {
        let mut h = Harness::new();
        h.device.set_fail_compilation(true);
        let mut v = volume();
        assert!(matches!(h.update(&mut v), Err(RenderError::ShaderCompilation(_))));
        assert!(h.frame.command_list.is_empty());
    }

    #[test]
    fn test_destroy_releases_buffers() {
        let mut h = Harness::new();
        let mut v = volume();
        h.update(&mut v).unwrap();
        v.destroy(&mut h.device);
        assert_eq!(h.device.live_buffer_count(), 0);
        assert_eq!(h.device.buffers_destroyed(), 6);
    }
}
