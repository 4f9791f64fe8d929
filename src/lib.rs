//! Sensorvol - rectangular pyramid sensor volumes
//!
//! Host-side glue around the render crate: configuration, the per-entity
//! visualizer that samples entity parameters onto volumes, explicit
//! registration, and the display loop that ties them to a render device.
//!
//! ## Key Components
//!
//! - [`config::AppConfig`] - Layered TOML and environment configuration
//! - [`visualizer::RectangularSensorVisualizer`] - Entity to volume synchronizer
//! - [`registry::VisualizerRegistry`] - Visualizer factories and packet processors
//! - [`display::SensorDisplay`] - Frame loop over entities, scene and device

pub mod config;
pub mod display;
pub mod registry;
pub mod visualizer;

pub use display::{DisplayError, FrameReport, SensorDisplay};
pub use registry::{Visualizer, VisualizerOptions, VisualizerRegistry};
pub use visualizer::RectangularSensorVisualizer;
