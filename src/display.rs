//! Host-side display loop
//!
//! [`SensorDisplay`] owns the entity collection, the scene of volumes, the
//! shader cache and the visualizers built from a [`VisualizerRegistry`].
//! Each [`SensorDisplay::update`] drains pending collection changes,
//! samples every visualizer, updates the scene and submits the frame.

use std::fmt;

use sensorvol_core::{CollectionError, DocumentError, EntityCollection, SensorDocument, SimTime};
use sensorvol_render::{
    FrameResources, FrameState, RenderDevice, RenderError, SensorScene, ShaderCache, SubmitStats,
    UnitSphereMeshProvider,
};

use crate::config::ConfigError;
use crate::registry::{Visualizer, VisualizerOptions, VisualizerRegistry};

/// Errors surfaced to the host loop
#[derive(Debug)]
pub enum DisplayError {
    Render(RenderError),
    Document(DocumentError),
    Collection(CollectionError),
    Config(ConfigError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Render(e) => write!(f, "Render error: {}", e),
            DisplayError::Document(e) => write!(f, "Document error: {}", e),
            DisplayError::Collection(e) => write!(f, "Collection error: {}", e),
            DisplayError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisplayError::Render(e) => Some(e),
            DisplayError::Document(e) => Some(e),
            DisplayError::Collection(e) => Some(e),
            DisplayError::Config(e) => Some(e),
        }
    }
}

impl From<RenderError> for DisplayError {
    fn from(e: RenderError) -> Self {
        DisplayError::Render(e)
    }
}

impl From<DocumentError> for DisplayError {
    fn from(e: DocumentError) -> Self {
        DisplayError::Document(e)
    }
}

impl From<CollectionError> for DisplayError {
    fn from(e: CollectionError) -> Self {
        DisplayError::Collection(e)
    }
}

impl From<ConfigError> for DisplayError {
    fn from(e: ConfigError) -> Self {
        DisplayError::Config(e)
    }
}

/// Outcome of one [`SensorDisplay::update`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter after this update
    pub frame_number: u64,
    /// Commands queued by the scene this frame
    pub commands: usize,
    /// What the device accepted
    pub submitted: SubmitStats,
}

/// Entities, visualizers and the scene they drive
#[derive(Debug)]
pub struct SensorDisplay {
    entities: EntityCollection,
    scene: SensorScene,
    shaders: ShaderCache,
    ellipsoid: UnitSphereMeshProvider,
    frame: FrameState,
    visualizers: Vec<Box<dyn Visualizer>>,
    registry: VisualizerRegistry,
}

impl SensorDisplay {
    /// Create a display over an empty collection starting at `time`
    pub fn new(registry: VisualizerRegistry, options: VisualizerOptions, time: SimTime) -> Self {
        let entities = EntityCollection::new();
        let visualizers = registry.create_visualizers(&entities, options);
        let names: Vec<_> = registry.visualizer_names().collect();
        log::info!("Sensor display using visualizers: {:?}", names);
        Self {
            entities,
            scene: SensorScene::new(),
            shaders: ShaderCache::new(),
            ellipsoid: UnitSphereMeshProvider,
            frame: FrameState::new(time),
            visualizers,
            registry,
        }
    }

    pub fn entities(&self) -> &EntityCollection {
        &self.entities
    }

    /// Mutable access for direct edits; changes reach visualizers on the next update
    pub fn entities_mut(&mut self) -> &mut EntityCollection {
        &mut self.entities
    }

    pub fn scene(&self) -> &SensorScene {
        &self.scene
    }

    pub fn shaders(&self) -> &ShaderCache {
        &self.shaders
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn set_view_projection(&mut self, view_projection: [[f32; 4]; 4]) {
        self.frame.view_projection = view_projection;
    }

    /// Apply a document's packets with the registered processors
    ///
    /// Returns the number of packets applied.
    pub fn load_document(&mut self, document: &SensorDocument) -> Result<usize, DisplayError> {
        let applied = document.apply(&mut self.entities, self.registry.processors())?;
        Ok(applied)
    }

    /// Forward pending collection changes to every visualizer
    pub fn process_changes(&mut self, device: &mut dyn RenderDevice) {
        let changes = self.entities.take_changes();
        if changes.is_empty() {
            return;
        }
        log::debug!(
            "Collection changed: {} added, {} changed, {} removed",
            changes.added.len(),
            changes.changed.len(),
            changes.removed.len()
        );
        for visualizer in &mut self.visualizers {
            visualizer.on_collection_changed(&self.entities, &changes, &mut self.scene, device);
        }
    }

    /// Advance to `time`: sync entities, rebuild stale volumes and submit the frame
    pub fn update(
        &mut self,
        time: SimTime,
        device: &mut dyn RenderDevice,
    ) -> Result<FrameReport, DisplayError> {
        self.process_changes(device);
        self.frame.begin(time);

        for visualizer in &mut self.visualizers {
            visualizer.update(time, &self.entities, &mut self.scene)?;
        }

        let mut resources = FrameResources {
            device: &mut *device,
            shaders: &mut self.shaders,
            ellipsoid: &self.ellipsoid,
        };
        let commands = self.scene.update(&mut self.frame, &mut resources)?;
        let submitted = device.submit(&self.frame.command_list)?;

        log::trace!("Frame {} at {}: {} commands", self.frame.frame_number, time, commands);
        Ok(FrameReport {
            frame_number: self.frame.frame_number,
            commands,
            submitted,
        })
    }

    /// Destroy every visualizer and any volume left in the scene
    pub fn destroy(mut self, device: &mut dyn RenderDevice) {
        for visualizer in self.visualizers.drain(..) {
            visualizer.destroy(&mut self.scene, device);
        }
        self.scene.clear(device);
    }
}
