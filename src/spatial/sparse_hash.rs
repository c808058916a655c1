//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::{EntityId, Vec2};

/// Sparse hash grid for radius queries over entity positions
///
/// Only occupied cells are allocated. Radius queries visit every cell that
/// can contain a point within the radius, then filter by exact distance, so
/// they return exactly what a linear scan would.
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    /// Entities whose stored position lies within `radius` of `center`
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let (min_x, min_y) = self.cell_coord(Vec2::new(center.x - radius, center.y - radius));
        let (max_x, max_y) = self.cell_coord(Vec2::new(center.x + radius, center.y + radius));

        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    found.extend(
                        cell.iter()
                            .filter(|(_, pos)| center.distance(pos) <= radius)
                            .map(|&(entity, _)| entity),
                    );
                }
            }
        }
        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, entities: impl Iterator<Item = (EntityId, Vec2)>) {
        self.clear();
        for (entity, pos) in entities {
            self.insert(entity, pos);
        }
    }
}
