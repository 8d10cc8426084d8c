//! FrogCafe Headless Simulation Harness
//!
//! Validates the customer-flow logic and level data without a renderer.
//! Runs entirely in-process: scripted scenarios, then full seeded days
//! played by an automatic barista with invariant sweeps every tick.
//!
//! Usage:
//!   cargo run -p frogcafe-simtest
//!   cargo run -p frogcafe-simtest -- --verbose
//!   cargo run -p frogcafe-simtest -- path/to/level.json

use std::collections::HashSet;

use frogcafe_core::prelude::*;
use frogcafe_logic::config::CafeConfig;
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::{Cell, TileGrid};
use frogcafe_logic::layout::LevelLayout;
use frogcafe_logic::order::{CupType, TeaType};
use frogcafe_logic::pathfinding::{find_cell_path, find_path};
use frogcafe_logic::progress::{FailureReason, ProgressEvent, RunOutcome};
use frogcafe_logic::queue::QueueCoordinator;
use frogcafe_logic::reservation::ReservationTable;
use frogcafe_logic::seats::SeatRegistry;
use hecs::Entity;

// ── Level and tuning data (same JSON a front end ships) ────────────────
const LEVEL_JSON: &str = include_str!("../../../data/demo_level.json");
const CONFIG_JSON: &str = include_str!("../../../data/cafe_config.json");

const DT: f32 = 0.05;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let level_path = std::env::args().skip(1).find(|a| !a.starts_with("--"));

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("=== FrogCafe Simulation Harness ===\n");

    let level_json = match &level_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Level loaded from {} ({} bytes)", path, json.len());
                json
            }
            Err(e) => {
                log::error!("Cannot read level {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => {
            log::info!("Using built-in demo level");
            LEVEL_JSON.to_string()
        }
    };

    let mut results = Vec::new();

    // 1. Level and config data
    let (level_results, layout) = validate_level_data(&level_json, verbose);
    results.extend(level_results);

    if let Some(layout) = layout {
        // 2. Grid & pathfinding on the level
        results.extend(validate_level_pathfinding(&layout, verbose));

        // 5. Full seeded days on the level
        results.extend(validate_seeded_days(&layout, verbose));
    }

    // 3. Pathfinding on synthetic grids
    results.extend(validate_pathfinding(verbose));

    // 4. Shared services
    results.extend(validate_services(verbose));

    // 6. Customer flow scenarios
    results.extend(validate_customer_flow(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Level data ───────────────────────────────────────────────────────

fn validate_level_data(json: &str, verbose: bool) -> (Vec<TestResult>, Option<LevelLayout>) {
    println!("--- Level Data ---");
    let mut results = Vec::new();

    let layout = match LevelLayout::from_json(json) {
        Ok(layout) => layout,
        Err(e) => {
            results.push(check("level_parse", false, format!("level error: {}", e)));
            return (results, None);
        }
    };
    results.push(check(
        "level_parse",
        true,
        format!("{} rows, cell size {}", layout.rows.len(), layout.cell_size),
    ));

    let grid = match layout.build_grid() {
        Ok(grid) => grid,
        Err(e) => {
            results.push(check("level_grid", false, format!("grid error: {}", e)));
            return (results, None);
        }
    };
    let (w, h) = grid.dimensions();
    results.push(check(
        "level_grid",
        grid.walkable_count() > 0,
        format!("{}x{} grid, {} walkable cells", w, h, grid.walkable_count()),
    ));

    let warnings = layout.validate(&grid);
    if verbose {
        for w in &warnings {
            println!("    warning: {}", w);
        }
    }
    results.push(check(
        "level_no_warnings",
        warnings.is_empty(),
        format!("{} layout warnings", warnings.len()),
    ));

    results.push(check(
        "level_has_seats_and_queue",
        !layout.seats.is_empty() && !layout.queue_points.is_empty(),
        format!(
            "{} seats, {} queue points",
            layout.seats.len(),
            layout.queue_points.len()
        ),
    ));

    match CafeConfig::from_json(CONFIG_JSON) {
        Ok(config) => {
            let days = config.days.customers_per_day.len();
            results.push(check(
                "config_parse",
                true,
                format!(
                    "{} days, pool of {}, patience {}s",
                    days, config.spawn.pool_size, config.patience
                ),
            ));
            let defaults = CafeConfig::default();
            results.push(check(
                "config_matches_defaults",
                config.patience == defaults.patience
                    && config.customer_speed == defaults.customer_speed
                    && config.days.customers_per_day == defaults.days.customers_per_day,
                "shipped tuning equals built-in defaults",
            ));
        }
        Err(e) => results.push(check("config_parse", false, format!("config error: {}", e))),
    }

    (results, Some(layout))
}

// ── 2. Level pathfinding ────────────────────────────────────────────────

fn validate_level_pathfinding(layout: &LevelLayout, _verbose: bool) -> Vec<TestResult> {
    println!("--- Level Pathfinding ---");
    let mut results = Vec::new();
    let Ok(grid) = layout.build_grid() else {
        return results;
    };

    let to_counter = find_path(&grid, layout.spawn, layout.counter);
    results.push(check(
        "level_spawn_reaches_counter",
        !to_counter.is_empty(),
        format!("spawn → counter: {} waypoints", to_counter.len()),
    ));

    let unreachable_seats: Vec<usize> = layout
        .seats
        .iter()
        .enumerate()
        .filter(|(_, seat)| {
            grid.world_to_cell(layout.counter) != grid.world_to_cell(**seat)
                && find_path(&grid, layout.counter, **seat).is_empty()
        })
        .map(|(i, _)| i)
        .collect();
    results.push(check(
        "level_seats_reachable",
        unreachable_seats.is_empty(),
        if unreachable_seats.is_empty() {
            format!("all {} seats reachable from the counter", layout.seats.len())
        } else {
            format!("seats {:?} unreachable", unreachable_seats)
        },
    ));

    let exit = layout.exit_point();
    let exit_ok = layout
        .seats
        .iter()
        .all(|seat| !find_path(&grid, *seat, exit).is_empty());
    results.push(check(
        "level_exit_reachable",
        exit_ok,
        "exit reachable from every seat",
    ));

    results
}

// ── 3. Pathfinding ──────────────────────────────────────────────────────

fn open_grid(w: i32, h: i32) -> TileGrid {
    let floor: Vec<Cell> = (0..w)
        .flat_map(|x| (0..h).map(move |y| Cell::new(x, y)))
        .collect();
    TileGrid::build(&floor, &[], Vec2::ZERO, 1.0)
}

fn path_is_valid(grid: &TileGrid, start: Cell, path: &[Cell]) -> bool {
    let mut prev = start;
    for cell in path {
        if !prev.is_adjacent(cell) || !grid.is_walkable(*cell) {
            return false;
        }
        prev = *cell;
    }
    true
}

fn validate_pathfinding(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pathfinding ---");
    let mut results = Vec::new();
    let grid = open_grid(5, 5);

    // Scenario A
    let path = find_cell_path(&grid, Cell::new(0, 0), Cell::new(4, 4));
    let len = path.as_ref().map(|p| p.len());
    results.push(check(
        "pathfind_5x5_corner",
        len == Some(8) && path.as_ref().is_some_and(|p| path_is_valid(&grid, Cell::new(0, 0), p)),
        format!("(0,0) → (4,4): {:?} steps, expected 8", len),
    ));

    let same = find_cell_path(&grid, Cell::new(2, 2), Cell::new(2, 2));
    results.push(check(
        "pathfind_same_cell",
        same.as_ref().is_some_and(|p| p.is_empty()),
        "same cell → empty path",
    ));

    // Wall across the middle with one gap
    let floor: Vec<Cell> = (0..7).flat_map(|x| (0..7).map(move |y| Cell::new(x, y))).collect();
    let wall: Vec<Cell> = (0..7).filter(|x| *x != 6).map(|x| Cell::new(x, 3)).collect();
    let walled = TileGrid::build(&floor, &wall, Vec2::ZERO, 1.0);
    let around = find_cell_path(&walled, Cell::new(0, 0), Cell::new(0, 6));
    results.push(check(
        "pathfind_around_wall",
        around.as_ref().is_some_and(|p| {
            p.len() == 18 && path_is_valid(&walled, Cell::new(0, 0), p)
        }),
        format!("detour length {:?}, expected 18", around.map(|p| p.len())),
    ));

    // Sealed room
    let sealed_wall: Vec<Cell> = (0..7).map(|x| Cell::new(x, 3)).collect();
    let sealed = TileGrid::build(&floor, &sealed_wall, Vec2::ZERO, 1.0);
    results.push(check(
        "pathfind_unreachable",
        find_cell_path(&sealed, Cell::new(0, 0), Cell::new(0, 6)).is_none(),
        "sealed wall → no path",
    ));
    results.push(check(
        "pathfind_world_unreachable_empty",
        find_path(&sealed, Vec2::new(0.5, 0.5), Vec2::new(0.5, 6.5)).is_empty(),
        "world path to sealed goal → empty",
    ));

    // Optimality sweep: every pair on an open grid matches Manhattan distance
    let sweep = open_grid(6, 4);
    let cells: Vec<Cell> = sweep.walkable_cells().collect();
    let mut bad = 0;
    for a in &cells {
        for b in &cells {
            let ok = find_cell_path(&sweep, *a, *b)
                .is_some_and(|p| p.len() as u32 == a.manhattan(b) && path_is_valid(&sweep, *a, &p));
            if !ok {
                bad += 1;
            }
        }
    }
    results.push(check(
        "pathfind_optimal_sweep",
        bad == 0,
        format!("{} pairs, {} non-optimal", cells.len() * cells.len(), bad),
    ));

    results
}

// ── 4. Shared services ──────────────────────────────────────────────────

fn validate_services(_verbose: bool) -> Vec<TestResult> {
    println!("--- Shared Services ---");
    let mut results = Vec::new();

    // Scenario B
    let mut table: ReservationTable<u32> = ReservationTable::new();
    let cell = Cell::new(2, 2);
    let first = table.try_reserve(cell, 1);
    let second = table.try_reserve(cell, 2);
    table.release(cell, 1);
    let retry = table.try_reserve(cell, 2);
    results.push(check(
        "reservation_contention",
        first && !second && retry && table.owner(cell) == Some(2),
        "first wins, second waits, succeeds after release",
    ));

    table.release(cell, 7);
    results.push(check(
        "reservation_idempotent_release",
        table.owner(cell) == Some(2) && table.len() == 1,
        "release by a non-owner changes nothing",
    ));

    // Scenario C
    let mut queue: QueueCoordinator<char> =
        QueueCoordinator::new(Vec2::ZERO, vec![Vec2::new(0.0, -2.0), Vec2::new(0.0, -1.0)], 0.6);
    queue.enroll('A');
    queue.enroll('B');
    queue.enroll('C');
    let first = queue.pop_front().map(|(c, _)| c);
    let second = queue.pop_front().map(|(c, _)| c);
    results.push(check(
        "queue_fifo",
        first == Some('A') && second == Some('B'),
        format!("pop order {:?}, {:?}", first, second),
    ));

    let mut queue: QueueCoordinator<u32> = QueueCoordinator::new(Vec2::ZERO, Vec::new(), 0.6);
    for c in 0..6 {
        queue.enroll(c);
    }
    queue.remove(2);
    queue.remove(4);
    let order: Vec<u32> = queue.iter().collect();
    let assignments = queue.reposition();
    let distinct: HashSet<(i32, i32)> = assignments
        .iter()
        .map(|a| ((a.target.x * 100.0) as i32, (a.target.y * 100.0) as i32))
        .collect();
    results.push(check(
        "queue_remove_keeps_order",
        order == vec![0, 1, 3, 5] && distinct.len() == assignments.len(),
        format!("line {:?}, {} distinct positions", order, distinct.len()),
    ));

    // Scenario E
    let mut seats: SeatRegistry<u32> =
        SeatRegistry::new(&[Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)]);
    let a = seats.try_assign(10);
    let b = seats.try_assign(11);
    let full = seats.try_assign(12);
    if let Some(id) = a {
        seats.notify_freed(id);
    }
    let again = seats.try_assign(12);
    results.push(check(
        "seats_full_then_freed",
        a.is_some() && b.is_some() && a != b && full.is_none() && again == a,
        format!("assigned {:?}/{:?}, full {:?}, after free {:?}", a, b, full, again),
    ));

    results
}

// ── 5. Full seeded days ─────────────────────────────────────────────────

/// Takes every order it can and serves every seated customer the right drink.
fn barista(engine: &mut CafeEngine) {
    if let Some(front) = engine.front_of_queue() {
        let _ = engine.request_order_taken(front);
    }
    for c in engine.active_customers() {
        let Some(customer) = engine.customer(c) else {
            continue;
        };
        if customer.state == CustomerState::Seated && !customer.served {
            let drink = HeldDrink::prepared_for(&customer.order);
            let _ = engine.offer_drink(c, &drink, ServeMode::Normal);
        }
    }
}

/// Sweep the engine's shared state. Returns a description of the first
/// broken invariant, if any.
fn invariant_violation(engine: &CafeEngine) -> Option<String> {
    let services = engine.services();
    let active: HashSet<Entity> = engine.active_customers().into_iter().collect();

    for (cell, owner) in services.reservations.iter() {
        if !active.contains(&owner) {
            return Some(format!("inactive {:?} owns {}", owner, cell));
        }
    }
    for c in &active {
        let held = services.reservations.cells_owned_by(*c);
        if held.len() > 2 {
            return Some(format!("{:?} holds {} cells", c, held.len()));
        }
    }

    for seat in services.seats.iter() {
        if let Some(occupant) = seat.occupant() {
            if engine.customer_seat(occupant) != Some(seat.id) {
                return Some(format!("seat {:?} occupant {:?} disagrees", seat.id, occupant));
            }
        }
    }

    let awaiting: Vec<Entity> = active
        .iter()
        .copied()
        .filter(|c| engine.customer_state(*c) == Some(CustomerState::AwaitingOrder))
        .collect();
    if awaiting.len() > 1 {
        return Some(format!("{} customers awaiting their order", awaiting.len()));
    }
    if let Some(c) = awaiting.first() {
        if engine.front_of_queue() != Some(*c) {
            return Some(format!("{:?} awaiting order but not front of queue", c));
        }
    }
    None
}

fn validate_seeded_days(layout: &LevelLayout, _verbose: bool) -> Vec<TestResult> {
    println!("--- Seeded Days ---");
    let mut results = Vec::new();

    for seed in [1u64, 7, 42] {
        let mut config = CafeConfig::default();
        config.days.day_length = 180.0;
        let mut engine = match CafeEngine::new(config, layout, seed) {
            Ok(engine) => engine,
            Err(e) => {
                results.push(check(&format!("day_seed_{}", seed), false, e.to_string()));
                continue;
            }
        };
        engine.start_run();

        let mut served = 0;
        let mut violation = None;
        let mut ticks = 0;
        while ticks < 20_000 && !engine.progress().is_game_over() {
            barista(&mut engine);
            engine.update(DT);
            ticks += 1;
            for event in engine.drain_events() {
                match event {
                    CafeEvent::CustomerServed { .. } => served += 1,
                    CafeEvent::Progress(ProgressEvent::DayEnded(day)) => {
                        log::info!("seed {}: day {} done at {:.1}s", seed, day, engine.sim_time());
                    }
                    _ => {}
                }
            }
            if violation.is_none() {
                violation = invariant_violation(&engine);
            }
        }

        results.push(check(
            &format!("day_seed_{}_invariants", seed),
            violation.is_none(),
            violation.unwrap_or_else(|| format!("{} ticks swept", ticks)),
        ));
        results.push(check(
            &format!("day_seed_{}_served", seed),
            served > 0,
            format!(
                "{} served, outcome {}",
                served,
                engine
                    .progress()
                    .outcome()
                    .map(|o| o.to_string())
                    .unwrap_or_else(|| "still running".into())
            ),
        ));
        results.push(check(
            &format!("day_seed_{}_no_lost_customer", seed),
            engine.progress().outcome() != Some(RunOutcome::Lost(FailureReason::LostCustomer)),
            "barista never lets a seated customer give up",
        ));
    }

    results
}

// ── 6. Customer flow ────────────────────────────────────────────────────

fn run_until(engine: &mut CafeEngine, max_ticks: usize, done: impl Fn(&CafeEngine) -> bool) -> bool {
    for _ in 0..max_ticks {
        if done(engine) {
            return true;
        }
        engine.update(DT);
    }
    done(engine)
}

fn validate_customer_flow(_verbose: bool) -> Vec<TestResult> {
    println!("--- Customer Flow ---");
    let mut results = Vec::new();

    let mut config = CafeConfig::default();
    config.patience = 5.0;
    config.spawn.interval = 1000.0;
    config.days.day_length = 1000.0;
    let mut engine = match CafeEngine::new(config, &LevelLayout::demo(), 3) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(check("flow_engine", false, e.to_string()));
            return results;
        }
    };
    engine.start_run();

    let Some(c) = engine.spawn_customer() else {
        results.push(check("flow_spawn", false, "spawn failed"));
        return results;
    };
    let at_counter = run_until(&mut engine, 400, |e| {
        e.customer_state(c) == Some(CustomerState::AwaitingOrder)
    });
    results.push(check(
        "flow_reaches_counter",
        at_counter,
        format!("arrived after {:.2}s", engine.sim_time()),
    ));

    let taken = engine.request_order_taken(c);
    let seated = taken.is_ok()
        && run_until(&mut engine, 400, |e| e.customer_state(c) == Some(CustomerState::Seated));
    results.push(check(
        "flow_seated",
        seated,
        format!("order {:?}, seat {:?}", taken, engine.customer_seat(c)),
    ));

    let wrong = HeldDrink::prepared_for(&Order::new(CupType::Mug, TeaType::Empty));
    let refused = engine.offer_drink(c, &wrong, ServeMode::Normal);
    results.push(check(
        "flow_wrong_drink_refused",
        refused == Ok(false),
        format!("wrong drink → {:?}", refused),
    ));

    // Scenario D
    engine.drain_events();
    let seated_at = engine.sim_time();
    let left = run_until(&mut engine, 200, |e| {
        e.customer_state(c) != Some(CustomerState::Seated)
    });
    let waited = engine.sim_time() - seated_at;
    let events = engine.drain_events();
    let leaving = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                CafeEvent::CustomerLeaving {
                    reason: LeaveReason::Impatient,
                    ..
                }
            )
        })
        .count();
    let game_overs = events
        .iter()
        .filter(|e| matches!(e, CafeEvent::Progress(ProgressEvent::GameOver(_))))
        .count();
    results.push(check(
        "flow_patience_runs_out",
        left && (4.9..=5.2).contains(&waited),
        format!("left after {:.2}s", waited),
    ));
    results.push(check(
        "flow_failure_signalled_once",
        leaving == 1 && game_overs == 1,
        format!("{} leaving events, {} game-over events", leaving, game_overs),
    ));
    results.push(check(
        "flow_reset_after_loss",
        engine.active_customer_count() == 0 && engine.services().reservations.is_empty(),
        "every customer cleared after the run ended",
    ));

    results
}
