//! Perception system - which entities an agent notices this tick
//!
//! Agents only ever read the frozen tick snapshot. The linear scan is the
//! reference; the grid-backed query must produce the same list in the same
//! (snapshot) order.

use ahash::AHashMap;

use crate::core::config::PerceptionConfig;
use crate::core::types::{EntityId, Vec2};
use crate::entity::EntitySnapshot;
use crate::spatial::sparse_hash::SparseHashGrid;

/// One entity within detection range of an observer
#[derive(Debug, Clone, Copy)]
pub struct Perceived<'a> {
    pub entity: &'a EntitySnapshot,
    pub distance: f32,
}

fn is_perceivable(observer: EntityId, other: &EntitySnapshot) -> bool {
    other.id != observer && other.active && other.visible
}

/// O(n) scan over the snapshot
pub fn detect<'a>(
    observer: EntityId,
    position: Vec2,
    radius: f32,
    snapshot: &'a [EntitySnapshot],
) -> Vec<Perceived<'a>> {
    snapshot
        .iter()
        .filter(|other| is_perceivable(observer, other))
        .filter_map(|other| {
            let distance = position.distance(&other.position);
            (distance <= radius).then_some(Perceived {
                entity: other,
                distance,
            })
        })
        .collect()
}

/// Grid-accelerated equivalent of `detect`
pub fn detect_with_grid<'a>(
    observer: EntityId,
    position: Vec2,
    radius: f32,
    snapshot: &'a [EntitySnapshot],
    grid: &SparseHashGrid,
    slots: &AHashMap<EntityId, usize>,
) -> Vec<Perceived<'a>> {
    let mut found: Vec<usize> = grid
        .query_radius(position, radius)
        .into_iter()
        .filter_map(|id| slots.get(&id).copied())
        .collect();
    found.sort_unstable();

    found
        .into_iter()
        .map(|slot| &snapshot[slot])
        .filter(|other| is_perceivable(observer, other))
        .map(|other| Perceived {
            entity: other,
            distance: position.distance(&other.position),
        })
        .collect()
}

/// Tick-wide read-only view shared by every agent
pub struct WorldView<'a> {
    entities: &'a [EntitySnapshot],
    slots: AHashMap<EntityId, usize>,
    grid: Option<SparseHashGrid>,
}

impl<'a> WorldView<'a> {
    pub fn new(entities: &'a [EntitySnapshot], config: &PerceptionConfig) -> Self {
        let slots = entities
            .iter()
            .enumerate()
            .map(|(slot, e)| (e.id, slot))
            .collect();

        let grid = config.use_spatial_hash.then(|| {
            let mut grid = SparseHashGrid::new(config.grid_cell_size);
            grid.rebuild(entities.iter().map(|e| (e.id, e.position)));
            grid
        });

        Self {
            entities,
            slots,
            grid,
        }
    }

    pub fn entities(&self) -> &'a [EntitySnapshot] {
        self.entities
    }

    /// Resolve a tracked id against the snapshot
    ///
    /// Stale, inactive and hidden entities yield `None`, the same set `detect`
    /// never reports.
    pub fn get(&self, id: EntityId) -> Option<&'a EntitySnapshot> {
        let entities = self.entities;
        self.slots
            .get(&id)
            .map(|&slot| &entities[slot])
            .filter(|e| e.active && e.visible)
    }

    pub fn detect(&self, observer: EntityId, position: Vec2, radius: f32) -> Vec<Perceived<'a>> {
        match &self.grid {
            Some(grid) => {
                detect_with_grid(observer, position, radius, self.entities, grid, &self.slots)
            }
            None => detect(observer, position, radius, self.entities),
        }
    }
}
