//! Animated scene objects
//!
//! An Entity is an externally managed object with an optional time-varying
//! placement and optional sensor graphics.

use sensorvol_math::{Quat, Vec3};

use crate::graphics::{ConicSensorGraphics, CustomPatternSensorGraphics, RectangularSensorGraphics};
use crate::property::PropertyRef;
use crate::time::{SimTime, TimeIntervalCollection};

/// External identifier of an entity
pub type EntityId = String;

/// An animated object in the scene
#[derive(Clone, Debug)]
pub struct Entity {
    /// Unique identifier within a collection
    pub id: EntityId,
    /// Optional display name
    pub name: Option<String>,
    /// Static visibility toggle
    pub show: bool,
    /// Times at which the entity exists; `None` means always
    pub availability: Option<TimeIntervalCollection>,
    /// Earth-fixed position
    pub position: Option<PropertyRef<Vec3>>,
    /// Orientation relative to the Earth-fixed frame
    pub orientation: Option<PropertyRef<Quat>>,
    pub rectangular_sensor: Option<RectangularSensorGraphics>,
    pub conic_sensor: Option<ConicSensorGraphics>,
    pub custom_pattern_sensor: Option<CustomPatternSensorGraphics>,
}

impl Entity {
    /// Create a visible, always-available entity with nothing attached
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            show: true,
            availability: None,
            position: None,
            orientation: None,
            rectangular_sensor: None,
            conic_sensor: None,
            custom_pattern_sensor: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, position: PropertyRef<Vec3>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_orientation(mut self, orientation: PropertyRef<Quat>) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_availability(mut self, availability: TimeIntervalCollection) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_rectangular_sensor(mut self, graphics: RectangularSensorGraphics) -> Self {
        self.rectangular_sensor = Some(graphics);
        self
    }

    /// Whether the entity is toggled visible
    pub fn is_showing(&self) -> bool {
        self.show
    }

    /// Whether the entity exists at `time`
    pub fn is_available(&self, time: SimTime) -> bool {
        self.availability.as_ref().map_or(true, |a| a.contains(time))
    }
}
