//! Integration tests for the shared customer-flow services.
//!
//! Exercises: LevelLayout → TileGrid → A* paths, plus the three shared
//! mutable structures (ReservationTable, QueueCoordinator, SeatRegistry)
//! under randomized operation sequences.
//!
//! All tests are pure logic, no ECS.

use std::collections::{HashMap, HashSet, VecDeque};

use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::{Cell, TileGrid};
use frogcafe_logic::layout::LevelLayout;
use frogcafe_logic::pathfinding::{find_cell_path, find_path};
use frogcafe_logic::queue::QueueCoordinator;
use frogcafe_logic::reservation::ReservationTable;
use frogcafe_logic::seats::{SeatId, SeatRegistry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── Helpers ────────────────────────────────────────────────────────────

fn open_grid(w: i32, h: i32) -> TileGrid {
    let floor: Vec<Cell> = (0..w)
        .flat_map(|x| (0..h).map(move |y| Cell::new(x, y)))
        .collect();
    TileGrid::build(&floor, &[], Vec2::ZERO, 1.0)
}

/// Random grid with roughly `density` of its cells blocked.
fn random_grid(rng: &mut ChaCha8Rng, w: i32, h: i32, density: f64) -> TileGrid {
    let floor: Vec<Cell> = (0..w)
        .flat_map(|x| (0..h).map(move |y| Cell::new(x, y)))
        .collect();
    let obstacles: Vec<Cell> = floor
        .iter()
        .copied()
        .filter(|_| rng.gen_bool(density))
        .collect();
    TileGrid::build(&floor, &obstacles, Vec2::ZERO, 1.0)
}

/// Reference shortest distance by breadth-first search.
fn bfs_distance(grid: &TileGrid, start: Cell, goal: Cell) -> Option<usize> {
    let mut dist: HashMap<Cell, usize> = HashMap::new();
    let mut frontier = VecDeque::new();
    dist.insert(start, 0);
    frontier.push_back(start);
    while let Some(cell) = frontier.pop_front() {
        if cell == goal {
            return dist.get(&cell).copied();
        }
        let d = dist[&cell];
        for n in grid.neighbors(cell) {
            if !dist.contains_key(&n) {
                dist.insert(n, d + 1);
                frontier.push_back(n);
            }
        }
    }
    None
}

fn assert_cardinal_walk(grid: &TileGrid, start: Cell, path: &[Cell]) {
    let mut prev = start;
    for cell in path {
        assert!(grid.is_walkable(*cell), "{} is not walkable", cell);
        assert!(prev.is_adjacent(cell), "{} -> {} is not a cardinal step", prev, cell);
        prev = *cell;
    }
}

// ── Pathfinding ────────────────────────────────────────────────────────

#[test]
fn scenario_a_open_five_by_five() {
    let grid = open_grid(5, 5);
    let start = Cell::new(0, 0);
    let path = find_cell_path(&grid, start, Cell::new(4, 4)).unwrap();

    assert_eq!(path.len(), 8);
    assert_cardinal_walk(&grid, start, &path);
}

#[test]
fn paths_are_valid_and_optimal_on_random_grids() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut reachable_pairs = 0;

    for _ in 0..40 {
        let grid = random_grid(&mut rng, 12, 9, 0.25);
        let cells: Vec<Cell> = grid.walkable_cells().collect();
        if cells.len() < 2 {
            continue;
        }
        for _ in 0..10 {
            let start = cells[rng.gen_range(0..cells.len())];
            let goal = cells[rng.gen_range(0..cells.len())];
            let path = find_cell_path(&grid, start, goal);

            match bfs_distance(&grid, start, goal) {
                Some(expected) => {
                    let path = path.expect("reachable goal must produce a path");
                    assert_eq!(path.len(), expected, "{} -> {}", start, goal);
                    assert_cardinal_walk(&grid, start, &path);
                    if expected > 0 {
                        assert_eq!(path.last(), Some(&goal));
                    }
                    reachable_pairs += 1;
                }
                None => assert!(path.is_none(), "{} -> {} should be unreachable", start, goal),
            }
        }
    }
    assert!(reachable_pairs > 100);
}

#[test]
fn pathfinding_is_deterministic() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let grid = random_grid(&mut rng, 15, 15, 0.2);
    let cells: Vec<Cell> = grid.walkable_cells().collect();
    let start = cells[0];
    let goal = cells[cells.len() - 1];
    assert_eq!(
        find_cell_path(&grid, start, goal),
        find_cell_path(&grid, start, goal)
    );
}

#[test]
fn world_path_ends_within_one_cell_of_goal() {
    let layout = LevelLayout::demo();
    let grid = layout.build_grid().unwrap();
    for seat in &layout.seats {
        let path = find_path(&grid, layout.spawn, *seat);
        let last = path.last().copied().expect("every demo seat is reachable from spawn");
        assert!(last.distance(seat) <= grid.cell_size());
    }
}

#[test]
fn demo_counter_and_queue_reachable_from_spawn() {
    let layout = LevelLayout::demo();
    let grid = layout.build_grid().unwrap();
    assert!(!find_path(&grid, layout.spawn, layout.counter).is_empty());
    for p in &layout.queue_points {
        let from_spawn = find_path(&grid, layout.spawn, *p);
        assert!(!from_spawn.is_empty() || grid.world_to_cell(*p) == grid.world_to_cell(layout.spawn));
    }
    assert!(!find_path(&grid, layout.counter, layout.exit_point()).is_empty());
}

// ── Reservations ───────────────────────────────────────────────────────

#[test]
fn scenario_b_contested_cell() {
    let mut table = ReservationTable::new();
    let cell = Cell::new(2, 2);
    assert!(table.try_reserve(cell, "first"));
    assert!(!table.try_reserve(cell, "second"));
    table.release(cell, "first");
    assert!(table.try_reserve(cell, "second"));
}

#[test]
fn reservations_never_have_two_owners() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut table: ReservationTable<u8> = ReservationTable::new();
    // Shadow model: what each mover believes it owns.
    let mut held: HashMap<u8, HashSet<Cell>> = HashMap::new();

    for _ in 0..2000 {
        let mover = rng.gen_range(0..6u8);
        let cell = Cell::new(rng.gen_range(0..4), rng.gen_range(0..4));
        match rng.gen_range(0..10) {
            0..=5 => {
                if table.try_reserve(cell, mover) {
                    held.entry(mover).or_default().insert(cell);
                }
            }
            6..=8 => {
                table.release(cell, mover);
                held.entry(mover).or_default().remove(&cell);
            }
            _ => {
                table.release_all(mover);
                held.remove(&mover);
            }
        }

        let mut seen: HashSet<Cell> = HashSet::new();
        for (m, cells) in &held {
            for c in cells {
                assert!(seen.insert(*c), "cell {} believed owned twice", c);
                assert_eq!(table.owner(*c), Some(*m));
            }
        }
        assert_eq!(seen.len(), table.len());
    }
}

#[test]
fn release_by_stranger_leaves_table_unchanged() {
    let mut table = ReservationTable::new();
    table.try_reserve(Cell::new(0, 0), 1u32);
    table.try_reserve(Cell::new(1, 0), 2u32);
    let before: Vec<(Cell, u32)> = {
        let mut v: Vec<_> = table.iter().collect();
        v.sort();
        v
    };

    table.release(Cell::new(0, 0), 2);
    table.release(Cell::new(5, 5), 1);

    let mut after: Vec<(Cell, u32)> = table.iter().collect();
    after.sort();
    assert_eq!(before, after);
}

// ── Queue ──────────────────────────────────────────────────────────────

#[test]
fn scenario_c_pop_in_enroll_order() {
    let mut queue = QueueCoordinator::new(Vec2::ZERO, vec![Vec2::new(0.0, -1.0)], 0.6);
    queue.enroll('A');
    queue.enroll('B');
    queue.enroll('C');
    assert_eq!(queue.pop_front().map(|(c, _)| c), Some('A'));
    assert_eq!(queue.pop_front().map(|(c, _)| c), Some('B'));
}

#[test]
fn fifo_fairness_under_random_operations() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut queue: QueueCoordinator<u32> = QueueCoordinator::new(Vec2::ZERO, vec![], 0.6);
    let mut model: VecDeque<u32> = VecDeque::new();
    let mut next_id = 0u32;

    for _ in 0..3000 {
        match rng.gen_range(0..3) {
            0 => {
                queue.enroll(next_id);
                model.push_back(next_id);
                next_id += 1;
            }
            1 => {
                if !model.is_empty() {
                    let victim = model[rng.gen_range(0..model.len())];
                    queue.remove(victim);
                    model.retain(|c| *c != victim);
                }
            }
            _ => {
                let popped = queue.pop_front().map(|(c, _)| c);
                assert_eq!(popped, model.pop_front());
            }
        }
        assert_eq!(queue.iter().collect::<Vec<_>>(), model.iter().copied().collect::<Vec<_>>());
    }
}

#[test]
fn reposition_assigns_every_rank_once() {
    let points = vec![
        Vec2::new(0.0, -3.0),
        Vec2::new(0.0, -2.0),
        Vec2::new(0.0, -1.0),
    ];
    let mut queue = QueueCoordinator::new(Vec2::ZERO, points, 0.6);
    for c in 0..5u32 {
        queue.enroll(c);
    }
    let assignments = queue.reposition();
    let ranks: Vec<usize> = assignments.iter().map(|a| a.rank).collect();
    assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    assert_eq!(assignments[0].target, Vec2::ZERO);
    assert_eq!(assignments[1].target, Vec2::new(0.0, -1.0));
    // ranks past the last slot share the back point
    assert_eq!(assignments[3].target, Vec2::new(0.0, -3.0));
    assert_eq!(assignments[4].target, Vec2::new(0.0, -3.0));
}

// ── Seats ──────────────────────────────────────────────────────────────

#[test]
fn scenario_e_full_registry_then_free() {
    let mut seats = SeatRegistry::new(&[Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
    seats.try_assign(1u32);
    seats.try_assign(2u32);
    assert_eq!(seats.try_assign(3u32), None);

    seats.notify_freed(SeatId(0));
    assert_eq!(seats.try_assign(3u32), Some(SeatId(0)));
}

#[test]
fn seats_are_never_double_booked() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let points: Vec<Vec2> = (0..4).map(|i| Vec2::new(i as f32, 0.0)).collect();
    let mut seats: SeatRegistry<u32> = SeatRegistry::new(&points);
    let mut holders: HashMap<SeatId, u32> = HashMap::new();
    let mut next_customer = 0u32;

    for _ in 0..1000 {
        if rng.gen_bool(0.6) {
            next_customer += 1;
            if let Some(id) = seats.try_assign(next_customer) {
                assert!(
                    holders.insert(id, next_customer).is_none(),
                    "seat {:?} handed out twice",
                    id
                );
            }
        } else if !holders.is_empty() {
            let ids: Vec<SeatId> = holders.keys().copied().collect();
            let id = ids[rng.gen_range(0..ids.len())];
            seats.notify_freed(id);
            holders.remove(&id);
        }

        assert_eq!(seats.occupied_count(), holders.len());
        for seat in seats.iter() {
            assert_eq!(seat.occupant(), holders.get(&seat.id).copied());
        }
    }
}
