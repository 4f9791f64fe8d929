//! Core types for sensor volume visualization
//!
//! This crate holds the host-side data model: time-sampled properties,
//! sensor graphics descriptors, entities, and scene document ingestion.
//!
//! ## Key Components
//!
//! - [`TimeProperty`] / [`PropertyRef`] - Values resolved at a simulation time
//! - [`RectangularSensorGraphics`] - Immutable sensor parameter bundle
//! - [`Material`] / [`MaterialProperty`] - Surface materials with stable identity
//! - [`Entity`] / [`EntityCollection`] - Animated objects with change tracking
//! - [`SensorDocument`] - RON scene documents and packet processors

pub mod time;
pub mod property;
mod color;
pub mod material;
pub mod graphics;
mod entity;
mod collection;
pub mod document;
mod error;

pub use time::{SimTime, TimeInterval, TimeIntervalCollection};
pub use property::{
    constant, value_or_default, value_or_undefined, ConstantProperty, Interpolate, IntervalProperty,
    PropertyRef, SampledProperty, ScopedProperty, TimeProperty,
};
pub use color::Color;
pub use material::{Material, MaterialId, MaterialKind, MaterialProperty};
pub use graphics::{
    ConicSensorGraphics, CustomPatternSensorGraphics, RectangularSensorGraphics, ScanPlaneMode,
    SensorCommonGraphics,
};
pub use entity::{Entity, EntityId};
pub use collection::{CollectionChanges, EntityCollection};
pub use document::{EntityPacket, PacketProcessor, SensorDocument};
pub use error::{CollectionError, DocumentError};

// Re-export math types for convenience
pub use sensorvol_math::{Quat, Spherical, Vec3};
