//! Content-addressed shader program cache
//!
//! Programs are keyed by their full source text, so every volume whose
//! material composes to the same text shares one compiled program. The cache
//! is append-only for the lifetime of its device: entries are immutable once
//! compiled and never evicted.
//!
//! # Architecture
//!
//! - [`ProgramId`] - Sequential identifier of a cached program (starts at 1)
//! - [`ProgramHandle`] - Copyable handle carrying the id and the device key
//! - [`ShaderCache`] - Source text to handle index

use std::collections::HashMap;

use super::shaders::ProgramSource;
use crate::device::{ProgramKey, RenderDevice};
use crate::error::RenderError;

/// Identifier of a program in the cache.
///
/// Ids are assigned sequentially starting from 1; 0 is never assigned.
pub type ProgramId = u64;

/// Handle to a compiled program
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct ProgramHandle {
    id: ProgramId,
    key: ProgramKey,
}

impl ProgramHandle {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Device key to bind when drawing
    pub fn key(&self) -> ProgramKey {
        self.key
    }
}

/// Shared cache of compiled sensor programs
pub struct ShaderCache {
    programs: HashMap<ProgramSource, ProgramHandle>,
    next_id: ProgramId,
    hits: u64,
}

impl std::fmt::Debug for ShaderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderCache")
            .field("programs", &self.programs.len())
            .field("hits", &self.hits)
            .finish()
    }
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCache {
    pub fn new() -> Self {
        Self {
            programs: HashMap::new(),
            next_id: 1,
            hits: 0,
        }
    }

    /// Return the cached program for `source`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Compilation failures are returned as-is and nothing is cached, so a
    /// later call with the same source compiles again.
    pub fn compile_or_fetch(
        &mut self,
        device: &mut dyn RenderDevice,
        label: &str,
        source: &ProgramSource,
    ) -> Result<ProgramHandle, RenderError> {
        if let Some(&handle) = self.programs.get(source) {
            self.hits += 1;
            return Ok(handle);
        }

        let key = device.compile_program(label, source)?;
        let handle = ProgramHandle { id: self.next_id, key };
        self.next_id += 1;

        log::debug!("Compiled program {} ({})", handle.id, label);
        self.programs.insert(source.clone(), handle);
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Lookups answered without compiling
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
