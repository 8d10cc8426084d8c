//! A* pathfinding over the tile grid.
//!
//! Uniform cost 1 per cardinal step with a Manhattan heuristic, which is
//! admissible and consistent on a 4-connected grid, so returned paths are
//! shortest. Nodes with equal f-score leave the open set in insertion order.
//!
//! Paths are **start-exclusive, end-inclusive**: the mover's own cell is
//! never a waypoint, the goal cell always is. A request whose start and goal
//! share a cell yields an empty path, as does an unreachable goal; callers
//! treat empty as "stay put".

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geometry::Vec2;
use crate::grid::{Cell, TileGrid};

/// Find a cell path from `start` to `goal`.
///
/// Returns `Some(vec![])` when `start == goal` and `None` when the goal
/// cannot be reached.
pub fn find_cell_path(grid: &TileGrid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    find_cell_path_avoiding(grid, start, goal, &HashSet::new())
}

/// Same as [`find_cell_path`] but treats every cell in `blocked` as an
/// obstacle for this search only.
pub fn find_cell_path_avoiding(
    grid: &TileGrid,
    start: Cell,
    goal: Cell,
    blocked: &HashSet<Cell>,
) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(Vec::new());
    }
    if !grid.is_walkable(goal) || blocked.contains(&goal) {
        return None;
    }

    // (f, insertion sequence, cell); the sequence keeps equal-f entries FIFO
    let mut open: BinaryHeap<Reverse<(u32, u64, Cell)>> = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut g_score: HashMap<Cell, u32> = HashMap::new();
    let mut closed: HashSet<Cell> = HashSet::new();
    let mut seq: u64 = 0;

    g_score.insert(start, 0);
    open.push(Reverse((start.manhattan(&goal), seq, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct(&came_from, start, current));
        }
        if !closed.insert(current) {
            // stale duplicate entry
            continue;
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);
        for neighbor in grid.neighbors(current) {
            if closed.contains(&neighbor) || blocked.contains(&neighbor) {
                continue;
            }
            let tentative = current_g.saturating_add(1);
            if g_score.get(&neighbor).map_or(true, |&g| tentative < g) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                seq += 1;
                open.push(Reverse((tentative + neighbor.manhattan(&goal), seq, neighbor)));
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut node = goal;
    while let Some(&prev) = came_from.get(&node) {
        if prev == start {
            break;
        }
        path.push(prev);
        node = prev;
    }
    path.reverse();
    path
}

/// World-space path: cell centers from the cell after `from` up to the cell
/// containing `to`. Empty when unreachable or already in the goal cell.
pub fn find_path(grid: &TileGrid, from: Vec2, to: Vec2) -> Vec<Vec2> {
    find_path_avoiding(grid, from, to, &HashSet::new())
}

/// World-space path that routes around `blocked` cells.
pub fn find_path_avoiding(
    grid: &TileGrid,
    from: Vec2,
    to: Vec2,
    blocked: &HashSet<Cell>,
) -> Vec<Vec2> {
    let start = grid.world_to_cell(from);
    let goal = grid.world_to_cell(to);
    find_cell_path_avoiding(grid, start, goal, blocked)
        .map(|cells| cells.into_iter().map(|c| grid.cell_center(c)).collect())
        .unwrap_or_default()
}

/// Append `second` to `first`, dropping the seam waypoint if both legs share it.
pub fn join_paths(mut first: Vec<Vec2>, second: Vec<Vec2>) -> Vec<Vec2> {
    let mut rest = second.into_iter().peekable();
    if let (Some(last), Some(next)) = (first.last(), rest.peek()) {
        if last.distance(next) < 0.01 {
            rest.next();
        }
    }
    first.extend(rest);
    first
}

/// Intermediate point for the queue → seat walk.
///
/// Steps `forward_step` toward the seat, then sideways by
/// `lateral_spacing * ceil(rank / 2)`, alternating sides by rank parity, so
/// customers leaving the line fan out instead of walking through it.
pub fn seat_detour_waypoint(
    from: Vec2,
    seat: Vec2,
    prior_rank: usize,
    forward_step: f32,
    lateral_spacing: f32,
) -> Vec2 {
    let mut dir = (seat - from).normalize();
    if dir.length() < 0.01 {
        dir = Vec2::UP;
    }
    let forward = from + dir * forward_step;
    let side = if prior_rank % 2 == 0 { 1.0 } else { -1.0 };
    let pairs = prior_rank.div_ceil(2) as f32;
    forward + dir.perp() * (lateral_spacing * pairs * side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(w: i32, h: i32) -> TileGrid {
        let floor: Vec<Cell> = (0..w)
            .flat_map(|x| (0..h).map(move |y| Cell::new(x, y)))
            .collect();
        TileGrid::build(&floor, &[], Vec2::ZERO, 1.0)
    }

    fn assert_valid(grid: &TileGrid, start: Cell, path: &[Cell]) {
        let mut prev = start;
        for c in path {
            assert!(grid.is_walkable(*c), "{} not walkable", c);
            assert!(prev.is_adjacent(c), "{} -> {} not adjacent", prev, c);
            prev = *c;
        }
    }

    #[test]
    fn test_open_grid_manhattan_length() {
        let grid = open_grid(5, 5);
        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert_eq!(path.len(), 8);
        assert_eq!(*path.last().unwrap(), Cell::new(4, 4));
        assert_valid(&grid, Cell::new(0, 0), &path);
    }

    #[test]
    fn test_same_cell_is_empty() {
        let grid = open_grid(3, 3);
        assert_eq!(find_cell_path(&grid, Cell::new(1, 1), Cell::new(1, 1)), Some(vec![]));
        assert!(find_path(&grid, Vec2::new(1.2, 1.2), Vec2::new(1.8, 1.7)).is_empty());
    }

    #[test]
    fn test_wall_detour_is_optimal() {
        // Wall at x = 2 for y in 0..4, gap at y = 4
        let floor: Vec<Cell> = (0..5)
            .flat_map(|x| (0..5).map(move |y| Cell::new(x, y)))
            .collect();
        let wall: Vec<Cell> = (0..4).map(|y| Cell::new(2, y)).collect();
        let grid = TileGrid::build(&floor, &wall, Vec2::ZERO, 1.0);

        let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(4, 0)).unwrap();
        // up 4, across 4, down 4
        assert_eq!(path.len(), 12);
        assert_valid(&grid, Cell::new(0, 0), &path);
    }

    #[test]
    fn test_unreachable_returns_none() {
        let floor: Vec<Cell> = (0..5).map(|x| Cell::new(x, 0)).collect();
        let grid = TileGrid::build(&floor, &[Cell::new(2, 0)], Vec2::ZERO, 1.0);
        assert_eq!(find_cell_path(&grid, Cell::new(0, 0), Cell::new(4, 0)), None);
        assert!(find_path(&grid, Vec2::new(0.5, 0.5), Vec2::new(4.5, 0.5)).is_empty());
    }

    #[test]
    fn test_unwalkable_goal_returns_none() {
        let grid = TileGrid::build(&[Cell::new(0, 0)], &[Cell::new(1, 0)], Vec2::ZERO, 1.0);
        assert_eq!(find_cell_path(&grid, Cell::new(0, 0), Cell::new(1, 0)), None);
    }

    #[test]
    fn test_deterministic_tie_break() {
        let grid = open_grid(6, 6);
        let a = find_cell_path(&grid, Cell::new(0, 0), Cell::new(5, 3));
        let b = find_cell_path(&grid, Cell::new(0, 0), Cell::new(5, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_avoiding_routes_around_blocked_cell() {
        let grid = open_grid(3, 3);
        let blocked: HashSet<Cell> = [Cell::new(1, 0)].into_iter().collect();
        let path = find_cell_path_avoiding(&grid, Cell::new(0, 0), Cell::new(2, 0), &blocked).unwrap();
        assert!(!path.contains(&Cell::new(1, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_world_path_uses_cell_centers() {
        let grid = open_grid(3, 1);
        let path = find_path(&grid, Vec2::new(0.1, 0.2), Vec2::new(2.9, 0.9));
        assert_eq!(path, vec![Vec2::new(1.5, 0.5), Vec2::new(2.5, 0.5)]);
    }

    #[test]
    fn test_join_paths_drops_shared_seam() {
        let a = vec![Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        let b = vec![Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)];
        assert_eq!(join_paths(a.clone(), b).len(), 3);
        let c = vec![Vec2::new(2.0, 1.0)];
        assert_eq!(join_paths(a, c).len(), 3);
    }

    #[test]
    fn test_seat_detour_alternates_sides() {
        let from = Vec2::new(0.0, 0.0);
        let seat = Vec2::new(0.0, 10.0);
        let rank0 = seat_detour_waypoint(from, seat, 0, 0.6, 0.35);
        assert!((rank0.x).abs() < 1e-5);
        assert!((rank0.y - 0.6).abs() < 1e-5);

        let rank1 = seat_detour_waypoint(from, seat, 1, 0.6, 0.35);
        let rank2 = seat_detour_waypoint(from, seat, 2, 0.6, 0.35);
        // perp of +y is -x; odd ranks flip to +x
        assert!((rank1.x - 0.35).abs() < 1e-5);
        assert!((rank2.x + 0.35).abs() < 1e-5);
    }
}
