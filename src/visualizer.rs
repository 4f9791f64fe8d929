//! Rectangular sensor visualizer
//!
//! Keeps one [`RectangularPyramidSensorVolume`] per entity that carries both
//! a position and a rectangular sensor, and copies the entity's sampled
//! parameters onto it every frame:
//! - Visibility from the entity, its availability and the sensor's `show`
//! - Placement from position and orientation, or aimed at a gaze target
//! - Every remaining graphics field, with the defaults below

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;

use sensorvol_core::{
    value_or_default, value_or_undefined, CollectionChanges, Color, Entity, EntityCollection,
    EntityId, Quat, ScanPlaneMode, SimTime, Vec3,
};
use sensorvol_math::{east_north_up_to_fixed_frame, mat3, mat4, Mat4};
use sensorvol_render::{PrimitiveKey, RectangularPyramidSensorVolume, RenderDevice, SensorScene};

use crate::display::DisplayError;
use crate::registry::{Visualizer, VisualizerOptions};

/// Intersection line width applied when the entity does not set one
///
/// Volumes built directly keep their own construction default.
pub const DEFAULT_INTERSECTION_WIDTH: f64 = 1.0;

/// Scan plane rate applied when the entity does not set one
pub const DEFAULT_SCAN_PLANE_RATE: f64 = 1.0;

/// Volume and last placement inputs for one tracked entity
#[derive(Debug)]
struct SensorEntry {
    primitive: PrimitiveKey,
    position: Option<Vec3>,
    orientation: Option<Quat>,
}

/// Maps entities with a rectangular sensor onto scene volumes
#[derive(Debug)]
pub struct RectangularSensorVisualizer {
    entities_to_visualize: BTreeSet<EntityId>,
    entries: HashMap<EntityId, SensorEntry>,
    options: VisualizerOptions,
}

/// Whether the entity exposes everything a volume needs to exist
fn qualifies(entity: &Entity) -> bool {
    entity.rectangular_sensor.is_some() && entity.position.is_some()
}

/// Placement that points local +Z from `position` toward `target`
///
/// Returns the model matrix and the distance, which replaces the radius.
pub fn gaze_placement(position: Vec3, target: Vec3) -> (Mat4, f64) {
    let diff = position - target;
    let axis = Vec3::Z.cross(diff);
    let rotation = if axis.length_squared() > 0.0 {
        Quat::from_axis_angle(axis, Vec3::Z.angle_between(diff) - PI).to_mat3()
    } else if diff.z < 0.0 {
        mat3::IDENTITY
    } else {
        // target straight down local -Z, or coincident
        mat3::from_rotation_x(PI)
    };
    (mat4::from_rotation_translation(rotation, position), position.distance(target))
}

impl RectangularSensorVisualizer {
    /// Create a visualizer and start tracking the qualifying entities already in `entities`
    pub fn new(entities: &EntityCollection, options: VisualizerOptions) -> Self {
        let mut visualizer = Self {
            entities_to_visualize: BTreeSet::new(),
            entries: HashMap::new(),
            options,
        };
        for entity in entities.iter().filter(|e| qualifies(e)) {
            visualizer.entities_to_visualize.insert(entity.id.clone());
        }
        log::debug!(
            "Rectangular sensor visualizer tracking {} entities",
            visualizer.entities_to_visualize.len()
        );
        visualizer
    }

    /// Number of tracked entities, with or without a volume yet
    pub fn tracked_count(&self) -> usize {
        self.entities_to_visualize.len()
    }

    pub fn is_tracking(&self, id: &str) -> bool {
        self.entities_to_visualize.contains(id)
    }

    /// Scene key of the volume built for `id`, once one exists
    pub fn primitive(&self, id: &str) -> Option<PrimitiveKey> {
        self.entries.get(id).map(|e| e.primitive)
    }

    fn remove_primitive(
        &mut self,
        id: &str,
        scene: &mut SensorScene,
        device: &mut dyn RenderDevice,
    ) {
        if let Some(entry) = self.entries.remove(id) {
            scene.remove_primitive(entry.primitive, device);
            log::info!("Destroyed sensor volume for entity {}", id);
        }
    }

    /// Sample one entity onto its volume
    fn update_entity(
        &mut self,
        time: SimTime,
        entity: &Entity,
        entities: &EntityCollection,
        scene: &mut SensorScene,
    ) {
        let Some(graphics) = entity.rectangular_sensor.as_ref() else {
            return;
        };

        let mut show = entity.is_showing()
            && entity.is_available(time)
            && value_or_default(graphics.show.as_ref(), time, true);

        let mut position = None;
        let mut orientation = None;
        let mut radius = None;
        let mut half_angles = None;
        if show {
            position = value_or_undefined(entity.position.as_ref(), time);
            orientation = value_or_undefined(entity.orientation.as_ref(), time);
            radius = value_or_undefined(graphics.radius.as_ref(), time);
            let x = value_or_undefined(graphics.x_half_angle.as_ref(), time);
            let y = value_or_undefined(graphics.y_half_angle.as_ref(), time);
            half_angles = x.zip(y);
            show = position.is_some() && half_angles.is_some();
        }

        let (Some(position), Some((x_half_angle, y_half_angle)), true) =
            (position, half_angles, show)
        else {
            let entry = self.entries.get(&entity.id);
            if let Some(volume) = entry.and_then(|e| scene.get_mut(e.primitive)) {
                volume.show = false;
            }
            return;
        };

        let has_volume = self.entries.get(&entity.id).is_some_and(|e| scene.contains(e.primitive));
        if !has_volume {
            let mut volume = RectangularPyramidSensorVolume::new().with_id(entity.id.as_str());
            volume.slice = self.options.slice_count;
            let primitive = scene.add_primitive(volume);
            log::info!("Created sensor volume for entity {}", entity.id);
            let entry = SensorEntry {
                primitive,
                position: None,
                orientation: None,
            };
            self.entries.insert(entity.id.clone(), entry);
        }
        let Some(entry) = self.entries.get_mut(&entity.id) else {
            return;
        };
        let Some(volume) = scene.get_mut(entry.primitive) else {
            return;
        };

        let gaze = value_or_undefined(graphics.gaze.as_ref(), time);
        if let Some(target_id) = gaze {
            let target = entities
                .get(&target_id)
                .and_then(|t| value_or_undefined(t.position.as_ref(), time));
            let Some(target) = target else {
                log::trace!(
                    "Gaze target {} of {} has no position at {}",
                    target_id,
                    entity.id,
                    time
                );
                return;
            };
            let (model_matrix, distance) = gaze_placement(position, target);
            volume.model_matrix = model_matrix;
            radius = Some(distance);
            // force the next ungazed frame to re-derive the placement
            entry.position = None;
            entry.orientation = None;
        } else if entry.position != Some(position) || entry.orientation != orientation {
            volume.model_matrix = match orientation {
                Some(q) => mat4::from_rotation_translation(q.to_mat3(), position),
                None => east_north_up_to_fixed_frame(position),
            };
            entry.position = Some(position);
            entry.orientation = orientation;
        }

        volume.show = true;
        volume.radius = radius.unwrap_or(f64::INFINITY);
        volume.x_half_angle = x_half_angle;
        volume.y_half_angle = y_half_angle;
        volume.line_color = value_or_default(graphics.line_color.as_ref(), time, Color::WHITE);
        volume.show_sector_lines =
            value_or_default(graphics.show_sector_lines.as_ref(), time, true);
        volume.show_sector_segment_lines =
            value_or_default(graphics.show_sector_segment_lines.as_ref(), time, true);
        volume.show_lateral_surfaces =
            value_or_default(graphics.show_lateral_surfaces.as_ref(), time, true);
        if let Some(material) = graphics.lateral_surface_material.as_ref() {
            volume.lateral_surface_material =
                material.resolve(time, Some(&volume.lateral_surface_material));
        }
        if let Some(material) = graphics.dome_surface_material.as_ref() {
            volume.dome_surface_material =
                material.resolve(time, Some(&volume.dome_surface_material));
        }
        volume.show_dome_surfaces =
            value_or_default(graphics.show_dome_surfaces.as_ref(), time, true);
        volume.show_dome_lines = value_or_default(graphics.show_dome_lines.as_ref(), time, true);
        volume.show_intersection =
            value_or_default(graphics.show_intersection.as_ref(), time, true);
        volume.intersection_color =
            value_or_default(graphics.intersection_color.as_ref(), time, Color::WHITE);
        volume.intersection_width = value_or_default(
            graphics.intersection_width.as_ref(),
            time,
            DEFAULT_INTERSECTION_WIDTH,
        );
        volume.show_through_ellipsoid =
            value_or_default(graphics.show_through_ellipsoid.as_ref(), time, true);
        volume.scan_plane_mode = value_or_default(
            graphics.scan_plane_mode.as_ref(),
            time,
            ScanPlaneMode::Horizontal,
        );
        volume.scan_plane_color =
            value_or_default(graphics.scan_plane_color.as_ref(), time, Color::WHITE);
        volume.show_scan_plane = value_or_default(graphics.show_scan_plane.as_ref(), time, true);
        volume.scan_plane_rate = value_or_default(
            graphics.scan_plane_rate.as_ref(),
            time,
            DEFAULT_SCAN_PLANE_RATE,
        );
    }
}

impl Visualizer for RectangularSensorVisualizer {
    fn name(&self) -> &'static str {
        "rectangular_sensor"
    }

    fn on_collection_changed(
        &mut self,
        entities: &EntityCollection,
        changes: &CollectionChanges,
        scene: &mut SensorScene,
        device: &mut dyn RenderDevice,
    ) {
        for id in &changes.added {
            if entities.get(id).is_some_and(qualifies) {
                self.entities_to_visualize.insert(id.clone());
            }
        }

        for id in &changes.changed {
            if entities.get(id).is_some_and(qualifies) {
                self.entities_to_visualize.insert(id.clone());
            } else {
                self.remove_primitive(id, scene, device);
                self.entities_to_visualize.remove(id);
            }
        }

        for id in &changes.removed {
            self.remove_primitive(id, scene, device);
            self.entities_to_visualize.remove(id);
        }
    }

    /// Sample every tracked entity at `time`
    ///
    /// Entities whose values cannot be resolved are hidden rather than
    /// removed, so their volumes and buffers survive a gap in coverage.
    fn update(
        &mut self,
        time: SimTime,
        entities: &EntityCollection,
        scene: &mut SensorScene,
    ) -> Result<bool, DisplayError> {
        let ids: Vec<EntityId> = self.entities_to_visualize.iter().cloned().collect();
        for id in ids {
            if let Some(entity) = entities.get(&id) {
                self.update_entity(time, entity, entities, scene);
            }
        }
        Ok(true)
    }

    fn destroy(mut self: Box<Self>, scene: &mut SensorScene, device: &mut dyn RenderDevice) {
        let ids: Vec<EntityId> = self.entries.keys().cloned().collect();
        for id in ids {
            self.remove_primitive(&id, scene, device);
        }
        self.entities_to_visualize.clear();
    }
}
