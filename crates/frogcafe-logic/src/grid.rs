//! Tile grid over the café floor.
//!
//! The grid is built once from the static level layout: a cell is walkable
//! when a floor tile is present and no obstacle tile covers it. Cells outside
//! the union of both layers are never walkable. Neighbors are cardinal only,
//! reported in the fixed order +x, −x, +y, −y.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Discrete grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
        }
    }

    /// Manhattan distance in cells.
    pub fn manhattan(&self, other: &Cell) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// True if `other` is exactly one cardinal step away.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.manhattan(other) == 1
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

const NEIGHBOR_DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Largest bounding box, in cells, a grid will allocate.
pub const MAX_GRID_CELLS: i64 = 1 << 24;

/// Walkability map plus world ↔ cell conversion.
#[derive(Debug, Clone)]
pub struct TileGrid {
    origin: Vec2,
    cell_size: f32,
    /// Inclusive lower corner of the precomputed bounds.
    min: Cell,
    width: i32,
    height: i32,
    walkable: Vec<bool>,
}

impl TileGrid {
    /// Build a grid from floor and obstacle tiles.
    ///
    /// Tiles whose bounding box exceeds [`MAX_GRID_CELLS`] produce an empty
    /// grid (nothing walkable) and an error log.
    pub fn build(floor: &[Cell], obstacles: &[Cell], origin: Vec2, cell_size: f32) -> Self {
        let mut grid = Self {
            origin,
            cell_size,
            min: Cell::default(),
            width: 0,
            height: 0,
            walkable: Vec::new(),
        };
        grid.rebuild(floor, obstacles);
        grid
    }

    /// Recompute walkability from scratch after a layout change.
    pub fn rebuild(&mut self, floor: &[Cell], obstacles: &[Cell]) {
        self.walkable.clear();
        self.width = 0;
        self.height = 0;

        let Some(first) = floor.iter().chain(obstacles).next() else {
            log::warn!("TileGrid: layout has no floor or obstacle tiles; nothing is walkable");
            return;
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for c in floor.iter().chain(obstacles) {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }

        let width = i64::from(max_x) - i64::from(min_x) + 1;
        let height = i64::from(max_y) - i64::from(min_y) + 1;
        let area = width.saturating_mul(height);
        if area > MAX_GRID_CELLS {
            log::error!(
                "TileGrid: bounds {}x{} exceed {} cells; nothing is walkable",
                width,
                height,
                MAX_GRID_CELLS
            );
            return;
        }

        // Both fit in i32 since their product is at most MAX_GRID_CELLS
        self.min = Cell::new(min_x, min_y);
        self.width = width as i32;
        self.height = height as i32;
        self.walkable = vec![false; area as usize];

        let blocked: HashSet<Cell> = obstacles.iter().copied().collect();
        for c in floor {
            if !blocked.contains(c) {
                if let Some(idx) = self.index(*c) {
                    self.walkable[idx] = true;
                }
            }
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let lx = i64::from(cell.x) - i64::from(self.min.x);
        let ly = i64::from(cell.y) - i64::from(self.min.y);
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        if lx < 0 || ly < 0 || lx >= width || ly >= height {
            return None;
        }
        Some((ly * width + lx) as usize)
    }

    /// Whether a cell lies inside the precomputed bounds.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    /// Walkable = floor present and no obstacle. Out of bounds is never walkable.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.walkable[i]).unwrap_or(false)
    }

    pub fn world_to_cell(&self, point: Vec2) -> Cell {
        Cell {
            x: ((point.x - self.origin.x) / self.cell_size).floor() as i32,
            y: ((point.y - self.origin.y) / self.cell_size).floor() as i32,
        }
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2 {
            x: self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            y: self.origin.y + (cell.y as f32 + 0.5) * self.cell_size,
        }
    }

    /// Walkable cardinal neighbors in +x, −x, +y, −y order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        NEIGHBOR_DELTAS
            .iter()
            .map(move |&(dx, dy)| cell.offset(dx, dy))
            .filter(move |n| self.is_walkable(*n))
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the precomputed bounds, in cells.
    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|w| **w).count()
    }

    /// All walkable cells, row by row from the lowest y.
    pub fn walkable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |ly| {
            (0..self.width).filter_map(move |lx| {
                let cell = Cell::new(self.min.x + lx, self.min.y + ly);
                self.is_walkable(cell).then_some(cell)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_floor(w: i32, h: i32) -> Vec<Cell> {
        (0..w)
            .flat_map(|x| (0..h).map(move |y| Cell::new(x, y)))
            .collect()
    }

    #[test]
    fn test_walkable_requires_floor_and_no_obstacle() {
        let floor = vec![Cell::new(0, 0), Cell::new(1, 0)];
        let obstacles = vec![Cell::new(1, 0), Cell::new(2, 0)];
        let grid = TileGrid::build(&floor, &obstacles, Vec2::ZERO, 1.0);

        assert!(grid.is_walkable(Cell::new(0, 0)));
        assert!(!grid.is_walkable(Cell::new(1, 0))); // floor + obstacle
        assert!(!grid.is_walkable(Cell::new(2, 0))); // obstacle only
        assert!(!grid.is_walkable(Cell::new(5, 5))); // out of bounds
        assert!(grid.in_bounds(Cell::new(2, 0)));
        assert!(!grid.in_bounds(Cell::new(3, 0)));
    }

    #[test]
    fn test_world_cell_round_trip() {
        let grid = TileGrid::build(&open_floor(4, 4), &[], Vec2::new(-2.0, -2.0), 0.5);
        let cell = Cell::new(3, 1);
        let center = grid.cell_center(cell);
        assert_eq!(center, Vec2::new(-0.25, -1.25));
        assert_eq!(grid.world_to_cell(center), cell);
        // Negative coordinates floor rather than truncate
        assert_eq!(grid.world_to_cell(Vec2::new(-2.1, -2.1)), Cell::new(-1, -1));
    }

    #[test]
    fn test_neighbors_cardinal_order() {
        let grid = TileGrid::build(&open_floor(3, 3), &[], Vec2::ZERO, 1.0);
        let n: Vec<Cell> = grid.neighbors(Cell::new(1, 1)).collect();
        assert_eq!(
            n,
            vec![
                Cell::new(2, 1),
                Cell::new(0, 1),
                Cell::new(1, 2),
                Cell::new(1, 0)
            ]
        );

        // Corner has two, no diagonals
        let corner: Vec<Cell> = grid.neighbors(Cell::new(0, 0)).collect();
        assert_eq!(corner, vec![Cell::new(1, 0), Cell::new(0, 1)]);
    }

    #[test]
    fn test_neighbors_skip_obstacles() {
        let grid = TileGrid::build(&open_floor(3, 3), &[Cell::new(2, 1)], Vec2::ZERO, 1.0);
        let n: Vec<Cell> = grid.neighbors(Cell::new(1, 1)).collect();
        assert!(!n.contains(&Cell::new(2, 1)));
        assert_eq!(n.len(), 3);
    }

    #[test]
    fn test_rebuild_replaces_layout() {
        let mut grid = TileGrid::build(&open_floor(2, 2), &[], Vec2::ZERO, 1.0);
        assert_eq!(grid.walkable_count(), 4);
        grid.rebuild(&open_floor(3, 1), &[Cell::new(0, 0)]);
        assert_eq!(grid.walkable_count(), 2);
        assert!(!grid.is_walkable(Cell::new(0, 1)));
    }

    #[test]
    fn test_empty_layout_is_unwalkable() {
        let grid = TileGrid::build(&[], &[], Vec2::ZERO, 1.0);
        assert_eq!(grid.walkable_count(), 0);
        assert_eq!(grid.neighbors(Cell::new(0, 0)).count(), 0);
    }

    #[test]
    fn test_far_apart_tiles_do_not_overflow() {
        let floor = [Cell::new(i32::MIN, 0), Cell::new(i32::MAX, 0)];
        let grid = TileGrid::build(&floor, &[], Vec2::ZERO, 1.0);
        assert_eq!(grid.walkable_count(), 0);
        assert!(!grid.is_walkable(Cell::new(i32::MAX, 0)));

        let floor = [Cell::new(0, 0), Cell::new(100_000, 100_000)];
        let grid = TileGrid::build(&floor, &[], Vec2::ZERO, 1.0);
        assert_eq!(grid.dimensions(), (0, 0));
        assert_eq!(grid.walkable_count(), 0);
    }

    #[test]
    fn test_tiles_at_coordinate_limits() {
        let floor = [Cell::new(i32::MAX - 1, i32::MIN), Cell::new(i32::MAX, i32::MIN)];
        let grid = TileGrid::build(&floor, &[], Vec2::ZERO, 1.0);
        assert_eq!(grid.walkable_count(), 2);
        let edge = Cell::new(i32::MAX, i32::MIN);
        assert_eq!(grid.neighbors(edge).collect::<Vec<_>>(), vec![Cell::new(i32::MAX - 1, i32::MIN)]);
        assert!(!grid.is_walkable(Cell::new(0, 0)));
        assert_eq!(Cell::new(i32::MIN, i32::MIN).manhattan(&Cell::new(i32::MAX, i32::MAX)), u32::MAX);
    }
}
