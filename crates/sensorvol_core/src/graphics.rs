//! Sensor graphics descriptors
//!
//! Descriptors are immutable bundles of optional time-varying properties.
//! Unset fields are `None`; the synchronizer applies its own defaults when
//! sampling. [`RectangularSensorGraphics::merge_defaults`] fills unset fields
//! of one descriptor from another without mutating either.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sensorvol_math::Spherical;

use crate::color::Color;
use crate::material::MaterialProperty;
use crate::property::PropertyRef;

/// Sweep axis of the scan plane
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPlaneMode {
    /// Plane sweeps across the Y half-angle, rotating about X
    #[default]
    Horizontal,
    /// Plane sweeps across the X half-angle, rotating about Y
    Vertical,
}

/// Graphics for a rectangular pyramid sensor attached to an entity
#[derive(Clone, Debug, Default)]
pub struct RectangularSensorGraphics {
    pub show: Option<PropertyRef<bool>>,
    pub radius: Option<PropertyRef<f64>>,
    pub x_half_angle: Option<PropertyRef<f64>>,
    pub y_half_angle: Option<PropertyRef<f64>>,
    pub line_color: Option<PropertyRef<Color>>,
    pub show_sector_lines: Option<PropertyRef<bool>>,
    pub show_sector_segment_lines: Option<PropertyRef<bool>>,
    pub show_lateral_surfaces: Option<PropertyRef<bool>>,
    pub lateral_surface_material: Option<MaterialProperty>,
    pub dome_surface_material: Option<MaterialProperty>,
    pub show_dome_surfaces: Option<PropertyRef<bool>>,
    pub show_dome_lines: Option<PropertyRef<bool>>,
    pub show_intersection: Option<PropertyRef<bool>>,
    pub intersection_color: Option<PropertyRef<Color>>,
    pub intersection_width: Option<PropertyRef<f64>>,
    pub show_through_ellipsoid: Option<PropertyRef<bool>>,
    /// Id of the entity this sensor should point at
    pub gaze: Option<PropertyRef<String>>,
    pub show_scan_plane: Option<PropertyRef<bool>>,
    pub scan_plane_color: Option<PropertyRef<Color>>,
    pub scan_plane_mode: Option<PropertyRef<ScanPlaneMode>>,
    /// Seconds per full sweep
    pub scan_plane_rate: Option<PropertyRef<f64>>,
}

fn pick<T: Clone>(overlay: &Option<T>, base: &Option<T>) -> Option<T> {
    overlay.clone().or_else(|| base.clone())
}

impl RectangularSensorGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// New descriptor taking every set field of `overlay`, and `base` elsewhere
    pub fn merge_defaults(overlay: &Self, base: &Self) -> Self {
        Self {
            show: pick(&overlay.show, &base.show),
            radius: pick(&overlay.radius, &base.radius),
            x_half_angle: pick(&overlay.x_half_angle, &base.x_half_angle),
            y_half_angle: pick(&overlay.y_half_angle, &base.y_half_angle),
            line_color: pick(&overlay.line_color, &base.line_color),
            show_sector_lines: pick(&overlay.show_sector_lines, &base.show_sector_lines),
            show_sector_segment_lines: pick(
                &overlay.show_sector_segment_lines,
                &base.show_sector_segment_lines,
            ),
            show_lateral_surfaces: pick(
                &overlay.show_lateral_surfaces,
                &base.show_lateral_surfaces,
            ),
            lateral_surface_material: pick(
                &overlay.lateral_surface_material,
                &base.lateral_surface_material,
            ),
            dome_surface_material: pick(
                &overlay.dome_surface_material,
                &base.dome_surface_material,
            ),
            show_dome_surfaces: pick(&overlay.show_dome_surfaces, &base.show_dome_surfaces),
            show_dome_lines: pick(&overlay.show_dome_lines, &base.show_dome_lines),
            show_intersection: pick(&overlay.show_intersection, &base.show_intersection),
            intersection_color: pick(&overlay.intersection_color, &base.intersection_color),
            intersection_width: pick(&overlay.intersection_width, &base.intersection_width),
            show_through_ellipsoid: pick(
                &overlay.show_through_ellipsoid,
                &base.show_through_ellipsoid,
            ),
            gaze: pick(&overlay.gaze, &base.gaze),
            show_scan_plane: pick(&overlay.show_scan_plane, &base.show_scan_plane),
            scan_plane_color: pick(&overlay.scan_plane_color, &base.scan_plane_color),
            scan_plane_mode: pick(&overlay.scan_plane_mode, &base.scan_plane_mode),
            scan_plane_rate: pick(&overlay.scan_plane_rate, &base.scan_plane_rate),
        }
    }
}

/// Properties shared by every sensor shape in scene documents
#[derive(Clone, Debug, Default)]
pub struct SensorCommonGraphics {
    pub show: Option<PropertyRef<bool>>,
    pub radius: Option<PropertyRef<f64>>,
    pub show_intersection: Option<PropertyRef<bool>>,
    pub intersection_color: Option<PropertyRef<Color>>,
    pub intersection_width: Option<PropertyRef<f64>>,
}

/// Conic sensor parameters, ingested for hosts that draw cones
#[derive(Clone, Debug, Default)]
pub struct ConicSensorGraphics {
    pub common: SensorCommonGraphics,
    pub inner_half_angle: Option<PropertyRef<f64>>,
    pub outer_half_angle: Option<PropertyRef<f64>>,
    pub minimum_clock_angle: Option<PropertyRef<f64>>,
    pub maximum_clock_angle: Option<PropertyRef<f64>>,
}

/// Custom-pattern sensor parameters: an outline given as pointing directions
#[derive(Clone, Debug, Default)]
pub struct CustomPatternSensorGraphics {
    pub common: SensorCommonGraphics,
    pub directions: Option<PropertyRef<Arc<[Spherical]>>>,
}
