//! Scene document ingestion
//!
//! Scene documents are RON files describing entities as packets. Each packet
//! may carry a placement and sensor graphics whose values are constant,
//! interval-scoped, or time-sampled. Packets are turned into properties on
//! [`Entity`] values by the base processor plus a list of sensor
//! [`PacketProcessor`]s the host registers.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sensorvol_math::{Quat, Spherical, Vec3};

use crate::collection::EntityCollection;
use crate::color::Color;
use crate::entity::Entity;
use crate::error::DocumentError;
use crate::graphics::{
    ConicSensorGraphics, CustomPatternSensorGraphics, RectangularSensorGraphics, ScanPlaneMode,
    SensorCommonGraphics,
};
use crate::material::MaterialProperty;
use crate::property::{
    constant, Interpolate, IntervalProperty, PropertyRef, SampledProperty, ScopedProperty,
};
use crate::time::{checked_add_seconds, parse_time, TimeInterval, TimeIntervalCollection};

/// Turns one part of an entity packet into entity properties
pub type PacketProcessor = fn(&mut Entity, &EntityPacket) -> Result<(), DocumentError>;

/// A value as written in a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValuePacket<T> {
    /// Same value at every time
    Constant(T),
    /// One value per `start/stop` interval
    Intervals(Vec<IntervalValue<T>>),
    /// Samples at offsets in seconds from `epoch`
    Sampled { epoch: String, samples: Vec<(f64, T)> },
}

/// A value valid over a `start/stop` interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalValue<T> {
    pub interval: String,
    pub value: T,
}

fn scoped<T: fmt::Debug + Send + Sync + 'static>(
    property: PropertyRef<T>,
    scope: Option<&TimeInterval>,
) -> PropertyRef<T> {
    match scope {
        Some(interval) => Arc::new(ScopedProperty::new(*interval, property)),
        None => property,
    }
}

impl<T> ValuePacket<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn interval_property(
        values: &[IntervalValue<T>],
    ) -> Result<IntervalProperty<T>, DocumentError> {
        values.iter().try_fold(IntervalProperty::new(), |property, entry| {
            let interval = TimeInterval::from_iso8601(&entry.interval)?;
            Ok(property.with_interval(interval, entry.value.clone()))
        })
    }

    /// Build a property for values that cannot be interpolated.
    ///
    /// Samples hold their value until the next sample; the last sample holds
    /// only at its own instant.
    pub fn to_stepped_property(
        &self,
        scope: Option<&TimeInterval>,
    ) -> Result<PropertyRef<T>, DocumentError> {
        let property: PropertyRef<T> = match self {
            ValuePacket::Constant(value) => constant(value.clone()),
            ValuePacket::Intervals(values) => Arc::new(Self::interval_property(values)?),
            ValuePacket::Sampled { epoch, samples } => {
                let epoch = parse_time(epoch)?;
                let mut property = IntervalProperty::new();
                for (index, (offset, value)) in samples.iter().enumerate() {
                    let start = checked_add_seconds(epoch, *offset)?;
                    let interval = match samples.get(index + 1) {
                        Some((next, _)) => {
                            TimeInterval::half_open(start, checked_add_seconds(epoch, *next)?)
                        }
                        None => TimeInterval::closed(start, start),
                    };
                    property = property.with_interval(interval, value.clone());
                }
                Arc::new(property)
            }
        };
        Ok(scoped(property, scope))
    }
}

impl<T> ValuePacket<T>
where
    T: Interpolate + Send + Sync + fmt::Debug + 'static,
{
    /// Build a property, interpolating sampled values linearly
    pub fn to_property(
        &self,
        scope: Option<&TimeInterval>,
    ) -> Result<PropertyRef<T>, DocumentError> {
        match self {
            ValuePacket::Sampled { epoch, samples } => {
                let epoch = parse_time(epoch)?;
                let mut property = SampledProperty::new();
                for (offset, value) in samples {
                    let time = checked_add_seconds(epoch, *offset)?;
                    property = property.with_sample(time, value.clone());
                }
                Ok(scoped(Arc::new(property), scope))
            }
            _ => self.to_stepped_property(scope),
        }
    }
}

/// Material as written in a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MaterialPacket {
    SolidColor { color: ValuePacket<Color> },
    Custom {
        name: String,
        source: String,
        #[serde(default)]
        translucent: bool,
    },
}

impl MaterialPacket {
    pub fn to_property(
        &self,
        scope: Option<&TimeInterval>,
    ) -> Result<MaterialProperty, DocumentError> {
        Ok(match self {
            MaterialPacket::SolidColor { color } => {
                MaterialProperty::Color(color.to_property(scope)?)
            }
            MaterialPacket::Custom {
                name,
                source,
                translucent,
            } => MaterialProperty::Custom {
                name: Arc::from(name.as_str()),
                source: Arc::from(source.as_str()),
                translucent: *translucent,
            },
        })
    }
}

/// Pointing directions in any of the accepted encodings
///
/// Only the first present encoding is used, in field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsPacket {
    /// Flat `[clock, cone, ...]` pairs
    #[serde(default)]
    pub unit_spherical: Option<Vec<f64>>,
    /// Flat `[clock, cone, magnitude, ...]` triples
    #[serde(default)]
    pub spherical: Option<Vec<f64>>,
    /// Flat `[x, y, z, ...]` triples, normalized to unit magnitude
    #[serde(default)]
    pub unit_cartesian: Option<Vec<f64>>,
    /// Flat `[x, y, z, ...]` triples
    #[serde(default)]
    pub cartesian: Option<Vec<f64>>,
}

fn chunks_exact_checked<'a>(
    values: &'a [f64],
    width: usize,
    name: &str,
) -> Result<std::slice::ChunksExact<'a, f64>, DocumentError> {
    if values.len() % width != 0 {
        return Err(DocumentError::InvalidDirections(format!(
            "{} has {} values, expected a multiple of {}",
            name,
            values.len(),
            width
        )));
    }
    Ok(values.chunks_exact(width))
}

impl DirectionsPacket {
    /// Normalize whichever encoding is present into spherical directions
    pub fn to_sphericals(&self) -> Result<Vec<Spherical>, DocumentError> {
        if let Some(values) = &self.unit_spherical {
            return Ok(chunks_exact_checked(values, 2, "unit_spherical")?
                .map(|c| Spherical::unit(c[0], c[1]))
                .collect());
        }
        if let Some(values) = &self.spherical {
            return Ok(chunks_exact_checked(values, 3, "spherical")?
                .map(|c| Spherical::new(c[0], c[1], c[2]))
                .collect());
        }
        if let Some(values) = &self.unit_cartesian {
            return Ok(chunks_exact_checked(values, 3, "unit_cartesian")?
                .map(|c| Spherical::from_cartesian(Vec3::new(c[0], c[1], c[2])).normalized())
                .collect());
        }
        if let Some(values) = &self.cartesian {
            return Ok(chunks_exact_checked(values, 3, "cartesian")?
                .map(|c| Spherical::from_cartesian(Vec3::new(c[0], c[1], c[2])))
                .collect());
        }
        Err(DocumentError::InvalidDirections("no direction encoding present".to_string()))
    }
}

/// Fields shared by every sensor packet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorCommonPacket {
    #[serde(default)]
    pub show: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub radius: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub show_intersection: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub intersection_color: Option<ValuePacket<Color>>,
    #[serde(default)]
    pub intersection_width: Option<ValuePacket<f64>>,
}

impl SensorCommonPacket {
    fn apply(
        &self,
        graphics: &mut SensorCommonGraphics,
        scope: Option<&TimeInterval>,
    ) -> Result<(), DocumentError> {
        set_stepped(&mut graphics.show, &self.show, scope)?;
        set_interpolated(&mut graphics.radius, &self.radius, scope)?;
        set_stepped(&mut graphics.show_intersection, &self.show_intersection, scope)?;
        set_interpolated(&mut graphics.intersection_color, &self.intersection_color, scope)?;
        set_interpolated(&mut graphics.intersection_width, &self.intersection_width, scope)?;
        Ok(())
    }
}

/// Rectangular sensor packet; every field is optional and overrides only
/// what it names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RectangularSensorPacket {
    /// `start/stop` interval scoping every value in this packet
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub show: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub radius: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub x_half_angle: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub y_half_angle: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub line_color: Option<ValuePacket<Color>>,
    #[serde(default)]
    pub show_sector_lines: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub show_sector_segment_lines: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub show_lateral_surfaces: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub lateral_surface_material: Option<MaterialPacket>,
    #[serde(default)]
    pub dome_surface_material: Option<MaterialPacket>,
    #[serde(default)]
    pub show_dome_surfaces: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub show_dome_lines: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub show_intersection: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub intersection_color: Option<ValuePacket<Color>>,
    #[serde(default)]
    pub intersection_width: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub show_through_ellipsoid: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub gaze: Option<ValuePacket<String>>,
    #[serde(default)]
    pub show_scan_plane: Option<ValuePacket<bool>>,
    #[serde(default)]
    pub scan_plane_color: Option<ValuePacket<Color>>,
    #[serde(default)]
    pub scan_plane_mode: Option<ValuePacket<ScanPlaneMode>>,
    #[serde(default)]
    pub scan_plane_rate: Option<ValuePacket<f64>>,
}

/// Conic sensor packet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConicSensorPacket {
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub common: SensorCommonPacket,
    #[serde(default)]
    pub inner_half_angle: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub outer_half_angle: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub minimum_clock_angle: Option<ValuePacket<f64>>,
    #[serde(default)]
    pub maximum_clock_angle: Option<ValuePacket<f64>>,
}

/// Custom-pattern sensor packet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomPatternSensorPacket {
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub common: SensorCommonPacket,
    #[serde(default)]
    pub directions: Option<DirectionsPacket>,
}

/// One entity's packet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPacket {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub show: Option<bool>,
    /// `start/stop` interval during which the entity exists
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub position: Option<ValuePacket<Vec3>>,
    #[serde(default)]
    pub orientation: Option<ValuePacket<Quat>>,
    #[serde(default)]
    pub rectangular_sensor: Option<RectangularSensorPacket>,
    #[serde(default)]
    pub conic_sensor: Option<ConicSensorPacket>,
    #[serde(default)]
    pub custom_pattern_sensor: Option<CustomPatternSensorPacket>,
}

impl EntityPacket {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            show: None,
            availability: None,
            position: None,
            orientation: None,
            rectangular_sensor: None,
            conic_sensor: None,
            custom_pattern_sensor: None,
        }
    }
}

fn set_interpolated<T>(
    target: &mut Option<PropertyRef<T>>,
    packet: &Option<ValuePacket<T>>,
    scope: Option<&TimeInterval>,
) -> Result<(), DocumentError>
where
    T: Interpolate + Send + Sync + fmt::Debug + 'static,
{
    if let Some(packet) = packet {
        *target = Some(packet.to_property(scope)?);
    }
    Ok(())
}

fn set_stepped<T>(
    target: &mut Option<PropertyRef<T>>,
    packet: &Option<ValuePacket<T>>,
    scope: Option<&TimeInterval>,
) -> Result<(), DocumentError>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    if let Some(packet) = packet {
        *target = Some(packet.to_stepped_property(scope)?);
    }
    Ok(())
}

fn parse_scope(interval: &Option<String>) -> Result<Option<TimeInterval>, DocumentError> {
    interval.as_deref().map(TimeInterval::from_iso8601).transpose()
}

/// Apply identity, visibility, availability, and placement from a packet
pub fn process_base(entity: &mut Entity, packet: &EntityPacket) -> Result<(), DocumentError> {
    if let Some(name) = &packet.name {
        entity.name = Some(name.clone());
    }
    if let Some(show) = packet.show {
        entity.show = show;
    }
    if let Some(availability) = &packet.availability {
        let interval = TimeInterval::from_iso8601(availability)?;
        entity.availability = Some(TimeIntervalCollection::from_intervals([interval]));
    }
    set_interpolated(&mut entity.position, &packet.position, None)?;
    set_interpolated(&mut entity.orientation, &packet.orientation, None)?;
    Ok(())
}

/// Apply a `rectangular_sensor` packet, keeping fields it does not name
pub fn process_rectangular_sensor(
    entity: &mut Entity,
    packet: &EntityPacket,
) -> Result<(), DocumentError> {
    let Some(data) = &packet.rectangular_sensor else {
        return Ok(());
    };
    let scope = parse_scope(&data.interval)?;
    let scope = scope.as_ref();

    let mut overlay = RectangularSensorGraphics::new();
    set_stepped(&mut overlay.show, &data.show, scope)?;
    set_interpolated(&mut overlay.radius, &data.radius, scope)?;
    set_interpolated(&mut overlay.x_half_angle, &data.x_half_angle, scope)?;
    set_interpolated(&mut overlay.y_half_angle, &data.y_half_angle, scope)?;
    set_interpolated(&mut overlay.line_color, &data.line_color, scope)?;
    set_stepped(&mut overlay.show_sector_lines, &data.show_sector_lines, scope)?;
    set_stepped(&mut overlay.show_sector_segment_lines, &data.show_sector_segment_lines, scope)?;
    set_stepped(&mut overlay.show_lateral_surfaces, &data.show_lateral_surfaces, scope)?;
    if let Some(material) = &data.lateral_surface_material {
        overlay.lateral_surface_material = Some(material.to_property(scope)?);
    }
    if let Some(material) = &data.dome_surface_material {
        overlay.dome_surface_material = Some(material.to_property(scope)?);
    }
    set_stepped(&mut overlay.show_dome_surfaces, &data.show_dome_surfaces, scope)?;
    set_stepped(&mut overlay.show_dome_lines, &data.show_dome_lines, scope)?;
    set_stepped(&mut overlay.show_intersection, &data.show_intersection, scope)?;
    set_interpolated(&mut overlay.intersection_color, &data.intersection_color, scope)?;
    set_interpolated(&mut overlay.intersection_width, &data.intersection_width, scope)?;
    set_stepped(&mut overlay.show_through_ellipsoid, &data.show_through_ellipsoid, scope)?;
    set_stepped(&mut overlay.gaze, &data.gaze, scope)?;
    set_stepped(&mut overlay.show_scan_plane, &data.show_scan_plane, scope)?;
    set_interpolated(&mut overlay.scan_plane_color, &data.scan_plane_color, scope)?;
    set_stepped(&mut overlay.scan_plane_mode, &data.scan_plane_mode, scope)?;
    set_interpolated(&mut overlay.scan_plane_rate, &data.scan_plane_rate, scope)?;

    let base = entity.rectangular_sensor.take().unwrap_or_default();
    entity.rectangular_sensor = Some(RectangularSensorGraphics::merge_defaults(&overlay, &base));
    Ok(())
}

/// Apply a `conic_sensor` packet
pub fn process_conic_sensor(
    entity: &mut Entity,
    packet: &EntityPacket,
) -> Result<(), DocumentError> {
    let Some(data) = &packet.conic_sensor else {
        return Ok(());
    };
    let scope = parse_scope(&data.interval)?;
    let scope = scope.as_ref();

    let graphics = entity.conic_sensor.get_or_insert_with(ConicSensorGraphics::default);
    data.common.apply(&mut graphics.common, scope)?;
    set_interpolated(&mut graphics.inner_half_angle, &data.inner_half_angle, scope)?;
    set_interpolated(&mut graphics.outer_half_angle, &data.outer_half_angle, scope)?;
    set_interpolated(&mut graphics.minimum_clock_angle, &data.minimum_clock_angle, scope)?;
    set_interpolated(&mut graphics.maximum_clock_angle, &data.maximum_clock_angle, scope)?;
    Ok(())
}

/// Apply a `custom_pattern_sensor` packet, normalizing its directions
pub fn process_custom_pattern_sensor(
    entity: &mut Entity,
    packet: &EntityPacket,
) -> Result<(), DocumentError> {
    let Some(data) = &packet.custom_pattern_sensor else {
        return Ok(());
    };
    let scope = parse_scope(&data.interval)?;
    let scope = scope.as_ref();

    let directions = data.directions.as_ref().map(DirectionsPacket::to_sphericals).transpose()?;

    let graphics = entity
        .custom_pattern_sensor
        .get_or_insert_with(CustomPatternSensorGraphics::default);
    data.common.apply(&mut graphics.common, scope)?;
    if let Some(directions) = directions {
        let directions: Arc<[Spherical]> = directions.into();
        graphics.directions = Some(scoped(constant(directions), scope));
    }
    Ok(())
}

/// A serializable scene document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDocument {
    /// Document name (for display/debugging)
    pub name: String,
    /// Entity packets, applied in order
    #[serde(default)]
    pub entities: Vec<EntityPacket>,
}

impl SensorDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entities: Vec::new() }
    }

    /// Load a document from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a document from RON text
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(text)?)
    }

    /// Apply every packet to `collection`, creating entities as needed.
    ///
    /// Returns the number of packets applied.
    pub fn apply(
        &self,
        collection: &mut EntityCollection,
        processors: &[PacketProcessor],
    ) -> Result<usize, DocumentError> {
        for packet in &self.entities {
            let mut entity = collection
                .get(&packet.id)
                .cloned()
                .unwrap_or_else(|| Entity::new(packet.id.clone()));
            process_base(&mut entity, packet)?;
            for processor in processors {
                processor(&mut entity, packet)?;
            }
            collection.upsert(entity);
        }
        log::info!("Applied {} packet(s) from document '{}'", self.entities.len(), self.name);
        Ok(self.entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::value_or_undefined;
    use crate::time::SimTime;

    const EPSILON: f64 = 1e-9;

    fn t(s: &str) -> SimTime {
        parse_time(s).unwrap()
    }

    const ALL_PROCESSORS: [PacketProcessor; 3] =
        [process_rectangular_sensor, process_conic_sensor, process_custom_pattern_sensor];

    #[test]
    fn test_parse_minimal_document() {
        let doc = SensorDocument::parse(r#"(name: "empty")"#).unwrap();
        assert_eq!(doc.name, "empty");
        assert!(doc.entities.is_empty());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(SensorDocument::parse("(name: )"), Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_apply_rectangular_sensor() {
        let text = r#"
            #![enable(implicit_some)]
            (
                name: "one",
                entities: [
                    (
                        id: "sat",
                        position: Constant((x: 1.0, y: 2.0, z: 3.0)),
                        rectangular_sensor: (
                            x_half_angle: Constant(0.5),
                            y_half_angle: Sampled(
                                epoch: "2024-01-01T00:00:00Z",
                                samples: [(0.0, 0.2), (10.0, 0.4)],
                            ),
                            scan_plane_mode: Constant(vertical),
                            lateral_surface_material: SolidColor(
                                color: Constant((red: 0.0, green: 1.0, blue: 0.0, alpha: 0.5)),
                            ),
                        ),
                    ),
                ],
            )
        "#;
        let doc = SensorDocument::parse(text).unwrap();
        let mut collection = EntityCollection::new();
        assert_eq!(doc.apply(&mut collection, &ALL_PROCESSORS).unwrap(), 1);

        let entity = collection.get("sat").unwrap();
        let time = t("2024-01-01T00:00:05Z");
        assert_eq!(
            value_or_undefined(entity.position.as_ref(), time),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );

        let sensor = entity.rectangular_sensor.as_ref().unwrap();
        assert_eq!(value_or_undefined(sensor.x_half_angle.as_ref(), time), Some(0.5));
        let y = value_or_undefined(sensor.y_half_angle.as_ref(), time).unwrap();
        assert!((y - 0.3).abs() < EPSILON);
        assert_eq!(
            value_or_undefined(sensor.scan_plane_mode.as_ref(), time),
            Some(ScanPlaneMode::Vertical)
        );
        assert!(matches!(sensor.lateral_surface_material, Some(MaterialProperty::Color(_))));
        assert!(sensor.radius.is_none());
    }

    #[test]
    fn test_second_packet_overrides_only_named_fields() {
        let mut first = EntityPacket::new("s");
        first.rectangular_sensor = Some(RectangularSensorPacket {
            x_half_angle: Some(ValuePacket::Constant(0.1)),
            y_half_angle: Some(ValuePacket::Constant(0.2)),
            ..Default::default()
        });
        let mut second = EntityPacket::new("s");
        second.rectangular_sensor = Some(RectangularSensorPacket {
            y_half_angle: Some(ValuePacket::Constant(0.9)),
            ..Default::default()
        });
        let doc = SensorDocument { name: "two".into(), entities: vec![first, second] };

        let mut collection = EntityCollection::new();
        doc.apply(&mut collection, &ALL_PROCESSORS).unwrap();
        let sensor = collection.get("s").unwrap().rectangular_sensor.clone().unwrap();
        let time = t("2024-01-01T00:00:00Z");
        assert_eq!(value_or_undefined(sensor.x_half_angle.as_ref(), time), Some(0.1));
        assert_eq!(value_or_undefined(sensor.y_half_angle.as_ref(), time), Some(0.9));
    }

    #[test]
    fn test_interval_scoped_packet() {
        let mut packet = EntityPacket::new("s");
        packet.rectangular_sensor = Some(RectangularSensorPacket {
            interval: Some("2024-01-01T00:00:00Z/2024-01-01T00:01:00Z".into()),
            radius: Some(ValuePacket::Constant(1000.0)),
            ..Default::default()
        });
        let mut entity = Entity::new("s");
        process_rectangular_sensor(&mut entity, &packet).unwrap();
        let radius = entity.rectangular_sensor.unwrap().radius;
        assert_eq!(value_or_undefined(radius.as_ref(), t("2024-01-01T00:00:30Z")), Some(1000.0));
        assert_eq!(value_or_undefined(radius.as_ref(), t("2024-01-01T00:02:00Z")), None);
    }

    #[test]
    fn test_stepped_samples_hold_until_next() {
        let packet = ValuePacket::Sampled {
            epoch: "2024-01-01T00:00:00Z".to_string(),
            samples: vec![(0.0, true), (10.0, false)],
        };
        let p = packet.to_stepped_property(None).unwrap();
        assert_eq!(p.value(t("2024-01-01T00:00:09Z")), Some(true));
        assert_eq!(p.value(t("2024-01-01T00:00:10Z")), Some(false));
        assert_eq!(p.value(t("2024-01-01T00:00:11Z")), None);
    }

    #[test]
    fn test_sample_offset_out_of_range() {
        let text = r#"
            #![enable(implicit_some)]
            (
                name: "far",
                entities: [
                    (
                        id: "sat",
                        position: Sampled(
                            epoch: "2024-01-01T00:00:00Z",
                            samples: [
                                (0.0, (x: 0.0, y: 0.0, z: 0.0)),
                                (1e13, (x: 1.0, y: 0.0, z: 0.0)),
                            ],
                        ),
                    ),
                ],
            )
        "#;
        let doc = SensorDocument::parse(text).unwrap();
        let mut collection = EntityCollection::new();
        let result = doc.apply(&mut collection, &ALL_PROCESSORS);
        assert!(matches!(result, Err(DocumentError::InvalidTime(_))));
        assert!(collection.get("sat").is_none());

        let stepped = ValuePacket::Sampled {
            epoch: "2024-01-01T00:00:00Z".to_string(),
            samples: vec![(0.0, true), (-1e13, false)],
        };
        assert!(matches!(stepped.to_stepped_property(None), Err(DocumentError::InvalidTime(_))));
    }

    #[test]
    fn test_base_availability_and_show() {
        let mut packet = EntityPacket::new("a");
        packet.show = Some(false);
        packet.availability = Some("2024-01-01T00:00:00Z/2024-01-02T00:00:00Z".into());
        let mut entity = Entity::new("a");
        process_base(&mut entity, &packet).unwrap();
        assert!(!entity.show);
        assert!(entity.is_available(t("2024-01-01T12:00:00Z")));
        assert!(!entity.is_available(t("2024-01-03T00:00:00Z")));

        packet.availability = Some("garbage".into());
        assert!(matches!(
            process_base(&mut entity, &packet),
            Err(DocumentError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_directions_encodings() {
        let unit_spherical = DirectionsPacket {
            unit_spherical: Some(vec![0.0, 0.5, 1.0, 0.25]),
            ..Default::default()
        };
        let d = unit_spherical.to_sphericals().unwrap();
        assert_eq!(d, vec![Spherical::unit(0.0, 0.5), Spherical::unit(1.0, 0.25)]);

        let spherical = DirectionsPacket {
            spherical: Some(vec![0.0, 0.5, 3.0]),
            ..Default::default()
        };
        assert_eq!(spherical.to_sphericals().unwrap()[0].magnitude, 3.0);

        let unit_cartesian = DirectionsPacket {
            unit_cartesian: Some(vec![0.0, 0.0, 2.0]),
            ..Default::default()
        };
        let d = unit_cartesian.to_sphericals().unwrap();
        assert_eq!(d[0].magnitude, 1.0);
        assert!(d[0].cone.abs() < EPSILON);

        let cartesian = DirectionsPacket {
            cartesian: Some(vec![0.0, 2.0, 0.0]),
            ..Default::default()
        };
        let d = cartesian.to_sphericals().unwrap();
        assert!((d[0].magnitude - 2.0).abs() < EPSILON);
        assert!((d[0].clock - std::f64::consts::FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_directions_errors() {
        let odd = DirectionsPacket {
            unit_spherical: Some(vec![0.0, 0.5, 1.0]),
            ..Default::default()
        };
        assert!(matches!(odd.to_sphericals(), Err(DocumentError::InvalidDirections(_))));
        assert!(DirectionsPacket::default().to_sphericals().is_err());
    }

    #[test]
    fn test_custom_pattern_and_conic_processing() {
        let mut packet = EntityPacket::new("c");
        packet.custom_pattern_sensor = Some(CustomPatternSensorPacket {
            directions: Some(DirectionsPacket {
                unit_cartesian: Some(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                ..Default::default()
            }),
            ..Default::default()
        });
        packet.conic_sensor = Some(ConicSensorPacket {
            outer_half_angle: Some(ValuePacket::Constant(0.7)),
            common: SensorCommonPacket {
                radius: Some(ValuePacket::Constant(50.0)),
                ..Default::default()
            },
            ..Default::default()
        });

        let mut entity = Entity::new("c");
        for processor in ALL_PROCESSORS {
            processor(&mut entity, &packet).unwrap();
        }
        let time = t("2024-01-01T00:00:00Z");
        let pattern = entity.custom_pattern_sensor.unwrap();
        assert_eq!(value_or_undefined(pattern.directions.as_ref(), time).unwrap().len(), 2);
        let conic = entity.conic_sensor.unwrap();
        assert_eq!(value_or_undefined(conic.outer_half_angle.as_ref(), time), Some(0.7));
        assert_eq!(value_or_undefined(conic.common.radius.as_ref(), time), Some(50.0));
        assert!(entity.rectangular_sensor.is_none());
    }
}
