//! Scene primitive collection
//!
//! Volumes are stored in a generational slotmap; a stale [`PrimitiveKey`]
//! from a removed volume never aliases a newer one.

use slotmap::{new_key_type, SlotMap};

use crate::command::FrameState;
use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::volume::{FrameResources, RectangularPyramidSensorVolume};

new_key_type! {
    /// Key of a primitive in a [`SensorScene`]
    pub struct PrimitiveKey;
}

/// The set of volumes updated every frame
#[derive(Debug, Default)]
pub struct SensorScene {
    primitives: SlotMap<PrimitiveKey, RectangularPyramidSensorVolume>,
}

impl SensorScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_primitive(&mut self, volume: RectangularPyramidSensorVolume) -> PrimitiveKey {
        let owner = volume.id.clone();
        let key = self.primitives.insert(volume);
        log::info!("Added sensor volume {:?} as {:?}", owner, key);
        key
    }

    /// Remove a volume and release its buffers before returning
    ///
    /// Returns false if the key was not in the scene.
    pub fn remove_primitive(&mut self, key: PrimitiveKey, device: &mut dyn RenderDevice) -> bool {
        match self.primitives.remove(key) {
            Some(volume) => {
                volume.destroy(device);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: PrimitiveKey) -> Option<&RectangularPyramidSensorVolume> {
        self.primitives.get(key)
    }

    pub fn get_mut(&mut self, key: PrimitiveKey) -> Option<&mut RectangularPyramidSensorVolume> {
        self.primitives.get_mut(key)
    }

    pub fn contains(&self, key: PrimitiveKey) -> bool {
        self.primitives.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveKey, &RectangularPyramidSensorVolume)> {
        self.primitives.iter()
    }

    /// Update every volume, appending their commands to the frame
    ///
    /// Returns the number of commands appended.
    pub fn update(
        &mut self,
        frame: &mut FrameState,
        resources: &mut FrameResources<'_>,
    ) -> Result<usize, RenderError> {
        let before = frame.command_list.len();
        for (key, volume) in self.primitives.iter_mut() {
            volume.update(frame, resources).inspect_err(|e| {
                log::error!("Sensor volume {:?} ({:?}) failed to update: {}", volume.id, key, e);
            })?;
        }
        Ok(frame.command_list.len() - before)
    }

    /// Remove and destroy every volume
    pub fn clear(&mut self, device: &mut dyn RenderDevice) {
        for (_, volume) in self.primitives.drain() {
            volume.destroy(device);
        }
    }
}
