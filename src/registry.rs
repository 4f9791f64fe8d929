//! Visualizer and packet processor registration
//!
//! Hosts build a [`VisualizerRegistry`] up front and hand it to
//! [`SensorDisplay`](crate::display::SensorDisplay). Nothing registers
//! itself behind the host's back.

use sensorvol_core::document::{
    process_conic_sensor, process_custom_pattern_sensor, process_rectangular_sensor,
};
use sensorvol_core::{CollectionChanges, EntityCollection, PacketProcessor, SimTime};
use sensorvol_render::{RenderDevice, SensorScene};

use crate::display::DisplayError;
use crate::visualizer::RectangularSensorVisualizer;

/// Settings passed to every visualizer factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizerOptions {
    /// Arc subdivision count for volumes the visualizer creates
    pub slice_count: usize,
}

impl Default for VisualizerOptions {
    fn default() -> Self {
        Self {
            slice_count: sensorvol_render::volume::DEFAULT_SLICE,
        }
    }
}

/// Maps one kind of entity graphics onto scene primitives
pub trait Visualizer: std::fmt::Debug {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Start or stop tracking entities named in a change set
    fn on_collection_changed(
        &mut self,
        entities: &EntityCollection,
        changes: &CollectionChanges,
        scene: &mut SensorScene,
        device: &mut dyn RenderDevice,
    );

    /// Bring primitives in line with their entities at `time`
    fn update(
        &mut self,
        time: SimTime,
        entities: &EntityCollection,
        scene: &mut SensorScene,
    ) -> Result<bool, DisplayError>;

    /// Remove every primitive this visualizer created
    fn destroy(self: Box<Self>, scene: &mut SensorScene, device: &mut dyn RenderDevice);
}

/// Builds a visualizer over an existing collection
pub type VisualizerFactory = fn(&EntityCollection, VisualizerOptions) -> Box<dyn Visualizer>;

fn rectangular_sensor_factory(
    entities: &EntityCollection,
    options: VisualizerOptions,
) -> Box<dyn Visualizer> {
    Box::new(RectangularSensorVisualizer::new(entities, options))
}

/// Registered visualizer factories and document packet processors
#[derive(Clone, Default)]
pub struct VisualizerRegistry {
    factories: Vec<(&'static str, VisualizerFactory)>,
    processors: Vec<PacketProcessor>,
}

impl VisualizerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the rectangular sensor visualizer and the sensor packet processors
    pub fn with_sensor_defaults() -> Self {
        Self::new()
            .with_visualizer("rectangular_sensor", rectangular_sensor_factory)
            .with_processor(process_rectangular_sensor)
            .with_processor(process_conic_sensor)
            .with_processor(process_custom_pattern_sensor)
    }

    /// Add a visualizer factory; a name registered twice keeps the first factory
    pub fn with_visualizer(mut self, name: &'static str, factory: VisualizerFactory) -> Self {
        if self.factories.iter().any(|(n, _)| *n == name) {
            log::warn!("Visualizer '{}' is already registered", name);
        } else {
            self.factories.push((name, factory));
        }
        self
    }

    pub fn with_processor(mut self, processor: PacketProcessor) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn processors(&self) -> &[PacketProcessor] {
        &self.processors
    }

    pub fn visualizer_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|(name, _)| *name)
    }

    /// Instantiate every registered visualizer, in registration order
    pub fn create_visualizers(
        &self,
        entities: &EntityCollection,
        options: VisualizerOptions,
    ) -> Vec<Box<dyn Visualizer>> {
        self.factories.iter().map(|(_, factory)| factory(entities, options)).collect()
    }
}

impl std::fmt::Debug for VisualizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizerRegistry")
            .field("visualizers", &self.factories.iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .field("processors", &self.processors.len())
            .finish()
    }
}
