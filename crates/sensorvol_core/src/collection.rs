//! Entity collection with change tracking
//!
//! Mutations are recorded in a pending [`CollectionChanges`] set that
//! consumers drain once per frame with [`EntityCollection::take_changes`].

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::{Entity, EntityId};
use crate::error::CollectionError;

/// Ids added, removed, or changed since the last drain
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionChanges {
    pub added: BTreeSet<EntityId>,
    pub removed: BTreeSet<EntityId>,
    pub changed: BTreeSet<EntityId>,
}

impl CollectionChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn record_added(&mut self, id: &EntityId) {
        // remove followed by add within one batch is reported as a change
        if self.removed.remove(id) {
            self.changed.insert(id.clone());
        } else {
            self.added.insert(id.clone());
        }
    }

    fn record_changed(&mut self, id: &EntityId) {
        if !self.added.contains(id) {
            self.changed.insert(id.clone());
        }
    }

    fn record_removed(&mut self, id: &EntityId) {
        self.changed.remove(id);
        if !self.added.remove(id) {
            self.removed.insert(id.clone());
        }
    }
}

/// Id-ordered set of entities
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: BTreeMap<EntityId, Entity>,
    pending: CollectionChanges,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new entity
    pub fn add(&mut self, entity: Entity) -> Result<(), CollectionError> {
        if self.entities.contains_key(&entity.id) {
            return Err(CollectionError::DuplicateId(entity.id));
        }
        self.pending.record_added(&entity.id);
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Insert or replace an entity by id
    pub fn upsert(&mut self, entity: Entity) {
        if self.entities.contains_key(&entity.id) {
            self.pending.record_changed(&entity.id);
        } else {
            self.pending.record_added(&entity.id);
        }
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Mutate an entity in place and record the change
    pub fn modify<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Entity) -> R,
    ) -> Result<R, CollectionError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CollectionError::UnknownId(id.to_string()))?;
        let result = f(entity);
        let id = entity.id.clone();
        self.pending.record_changed(&id);
        Ok(result)
    }

    /// Remove an entity, returning it if present
    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.pending.record_removed(&entity.id);
        Some(entity)
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate entities in id order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Drain the pending change set
    pub fn take_changes(&mut self) -> CollectionChanges {
        std::mem::take(&mut self.pending)
    }

    /// Peek at the pending change set without draining it
    pub fn pending_changes(&self) -> &CollectionChanges {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_duplicate() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        assert_eq!(c.add(Entity::new("a")), Err(CollectionError::DuplicateId("a".to_string())));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_changes_are_drained() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        let changes = c.take_changes();
        assert!(changes.added.contains("a"));
        assert!(c.take_changes().is_empty());
    }

    #[test]
    fn test_modify_records_change() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        c.take_changes();

        c.modify("a", |e| e.show = false).unwrap();
        let changes = c.take_changes();
        assert!(changes.changed.contains("a"));
        assert!(!c.get("a").unwrap().show);

        assert!(c.modify("missing", |_| ()).is_err());
    }

    #[test]
    fn test_add_then_change_stays_added() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        c.modify("a", |e| e.name = Some("A".into())).unwrap();
        let changes = c.take_changes();
        assert!(changes.added.contains("a"));
        assert!(changes.changed.is_empty());
    }

    #[test]
    fn test_add_then_remove_cancels() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        assert!(c.remove("a").is_some());
        assert!(c.take_changes().is_empty());
    }

    #[test]
    fn test_remove_existing_reports_removed() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        c.take_changes();
        c.modify("a", |_| ()).unwrap();
        c.remove("a");
        let changes = c.take_changes();
        assert!(changes.removed.contains("a"));
        assert!(changes.changed.is_empty());
        assert!(c.remove("a").is_none());
    }

    #[test]
    fn test_upsert() {
        let mut c = EntityCollection::new();
        c.upsert(Entity::new("a"));
        c.take_changes();
        c.upsert(Entity::new("a").with_name("again"));
        let changes = c.take_changes();
        assert!(changes.changed.contains("a"));
        assert_eq!(c.len(), 1);
    }
}
