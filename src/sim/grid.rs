//! Uniform spatial grid for collision broad-phase
//!
//! Entities are bucketed by the cell containing their center. A query visits
//! the entity's own cell and its eight neighbors, so the cell size must be at
//! least the largest sum of two collision radii for the grid to find every
//! overlap that brute force would.

use glam::Vec2;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Map from cell coordinates to entity indices
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    /// Grid cell containing a world position
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Indices in the 3x3 block of cells around `pos` (including `exclude`'s own cell)
    pub fn neighbors(&self, pos: Vec2, exclude: usize) -> Vec<usize> {
        let (cx, cy) = self.cell_of(pos);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    found.extend(indices.iter().copied().filter(|&i| i != exclude));
                }
            }
        }
        found
    }
}
