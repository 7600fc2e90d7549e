//! Entity arena
//!
//! The engine owns a single `World`. Entities spawned during a frame are
//! staged and only join the collection when [`World::commit`] runs at frame
//! end, so a frame never observes its own spawns mid-iteration.

use super::entity::{Entity, EntityId, EntityKind, Simulate};
use super::ship::Ship;

#[derive(Debug, Clone)]
pub struct World {
    /// Live collection, in spawn order
    pub entities: Vec<Entity>,
    pending: Vec<Entity>,
    next_id: EntityId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Assign an id and stage the entity for the next commit
    pub fn spawn(&mut self, entity: impl Into<Entity>) -> EntityId {
        let mut entity = entity.into();
        let id = self.allocate_id();
        entity.body_mut().id = id;
        log::debug!("spawn {:?} #{}", entity.kind(), id);
        self.pending.push(entity);
        id
    }

    /// Insert immediately, bypassing staging (setup outside the frame loop)
    pub fn insert(&mut self, entity: impl Into<Entity>) -> EntityId {
        let id = self.spawn(entity);
        self.commit();
        id
    }

    /// Move staged spawns into the live collection
    pub fn commit(&mut self) {
        self.entities.append(&mut self.pending);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop inactive entities; the ship is never removed
    pub fn prune(&mut self) {
        self.entities
            .retain(|e| e.is_active() || e.kind() == EntityKind::Ship);
    }

    /// Drop every entity of `kind`, live and staged
    pub fn clear_kind(&mut self, kind: EntityKind) {
        self.entities.retain(|e| e.kind() != kind);
        self.pending.retain(|e| e.kind() != kind);
    }

    /// Remove everything except the ship
    pub fn clear_all_but_ship(&mut self) {
        self.entities.retain(|e| e.kind() == EntityKind::Ship);
        self.pending.clear();
    }

    /// Active entities of `kind`, counting staged spawns
    pub fn active_count(&self, kind: EntityKind) -> usize {
        self.entities
            .iter()
            .chain(self.pending.iter())
            .filter(|e| e.kind() == kind && e.is_active())
            .count()
    }

    pub fn ship(&self) -> Option<&Ship> {
        self.entities.iter().find_map(Entity::as_ship)
    }

    pub fn ship_mut(&mut self) -> Option<&mut Ship> {
        self.entities.iter_mut().find_map(Entity::as_ship_mut)
    }

    /// Active entities in collection order
    pub fn active(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_active())
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }
}
