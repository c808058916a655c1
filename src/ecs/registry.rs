//! Canonical entity storage: dense arena plus id index
//!
//! Entities live in a `Vec` for cache-friendly per-tick iteration; the
//! `AHashMap` resolves ids to slots. Everything outside the registry holds
//! `EntityId`s and resolves them here, so a stale id simply yields `None`.

use ahash::AHashMap;

use crate::core::types::EntityId;
use crate::entity::body::Body;
use crate::entity::{Entity, EntityKind, EntitySnapshot};

#[derive(Debug, Default)]
pub struct Registry {
    entities: Vec<Entity>,
    index: AHashMap<EntityId, usize>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity under a fresh id
    pub fn spawn(&mut self, body: Body, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        if self.index.insert(id, self.entities.len()).is_some() {
            unreachable!("entity id {} issued twice", id);
        }
        self.entities.push(Entity { id, body, kind });
        id
    }

    /// Id the next `spawn` will issue
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&slot| &self.entities[slot])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index.get(&id).map(|&slot| &mut self.entities[slot])
    }

    /// Snapshot of every active entity, in registration order
    pub fn active_entities(&self) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter(|e| e.is_active())
            .map(Entity::snapshot)
            .collect()
    }

    /// Mark an entity inactive; it is removed on the next cleanup
    ///
    /// Returns false for unknown or already inactive ids.
    pub fn dispose(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) if entity.body.active => {
                entity.body.kill();
                true
            }
            _ => false,
        }
    }

    /// Drop every inactive entity and return their ids
    pub fn cleanup_inactive(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.entities.retain(|e| {
            if e.is_active() {
                true
            } else {
                removed.push(e.id);
                false
            }
        });

        if !removed.is_empty() {
            self.index.clear();
            for (slot, entity) in self.entities.iter().enumerate() {
                self.index.insert(entity.id, slot);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Slot-ordered mutable access for parallel per-entity phases
    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}
