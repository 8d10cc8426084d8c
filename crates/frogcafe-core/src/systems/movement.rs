//! Movement system - walks entities along grid paths under cell reservations.
//!
//! A mover claims the cell of its next waypoint before stepping toward it
//! and releases the cell it is leaving once the waypoint is reached. When a
//! claim fails the mover stands still; every `reserve_retry_interval` it may
//! replan around occupied cells, and two movers waiting on each other's
//! cells are separated by the higher-id one stepping aside.

use std::collections::{HashMap, HashSet};

use frogcafe_logic::config::CafeConfig;
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::{Cell, TileGrid};
use frogcafe_logic::pathfinding::{find_path_avoiding, join_paths};
use frogcafe_logic::reservation::ReservationTable;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{CellClaim, Movement, Position};
use crate::services::CafeServices;

/// Result of ordering an entity to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrder {
    /// Already standing on the destination; no movement was added
    AlreadyThere,
    Moving,
    /// No path yet; the movement will retry and eventually move directly
    Unreachable,
}

fn leg(grid: &TileGrid, from: Vec2, to: Vec2, blocked: &HashSet<Cell>) -> Option<Vec<Vec2>> {
    if grid.world_to_cell(from) == grid.world_to_cell(to) {
        return Some(Vec::new());
    }
    let path = find_path_avoiding(grid, from, to, blocked);
    (!path.is_empty()).then_some(path)
}

/// Plan a world route from `position` to exactly `destination`.
///
/// A mover part-way into `claimed` finishes that step first. The last cell
/// center is replaced by `destination` so arrival lands on the exact point.
/// `via` is honored when its cell is walkable and both legs exist.
pub fn plan_route(
    grid: &TileGrid,
    position: Vec2,
    claimed: Option<Cell>,
    destination: Vec2,
    via: Option<Vec2>,
    blocked: &HashSet<Cell>,
) -> Option<Vec<Vec2>> {
    let (start, prefix) = match claimed {
        Some(cell) => (grid.cell_center(cell), vec![grid.cell_center(cell)]),
        None => (position, Vec::new()),
    };

    let via = via.filter(|v| grid.is_walkable(grid.world_to_cell(*v)));
    let body = match via {
        Some(v) => match (leg(grid, start, v, blocked), leg(grid, v, destination, blocked)) {
            (Some(first), Some(second)) => join_paths(first, second),
            _ => leg(grid, start, destination, blocked)?,
        },
        None => leg(grid, start, destination, blocked)?,
    };

    let mut route = join_paths(prefix, body);
    let goal = grid.world_to_cell(destination);
    match route.last_mut() {
        Some(last) if grid.world_to_cell(*last) == goal => *last = destination,
        _ => route.push(destination),
    }
    Some(route)
}

fn direct_route(grid: &TileGrid, claimed: Option<Cell>, destination: Vec2) -> Vec<Vec2> {
    let mut route: Vec<Vec2> = claimed.map(|c| grid.cell_center(c)).into_iter().collect();
    route.push(destination);
    route
}

/// Cells reserved by anyone but `mover`, except `goal`.
fn held_by_others(reservations: &ReservationTable<Entity>, mover: Entity, goal: Cell) -> HashSet<Cell> {
    reservations
        .iter()
        .filter(|(cell, owner)| *owner != mover && *cell != goal)
        .map(|(cell, _)| cell)
        .collect()
}

/// Send `entity` toward `destination`, replacing any current movement.
pub fn command_move(
    world: &mut World,
    services: &CafeServices,
    config: &CafeConfig,
    entity: Entity,
    destination: Vec2,
    via: Option<Vec2>,
) -> MoveOrder {
    let (position, claim) = match world.query_one_mut::<(&Position, &CellClaim)>(entity) {
        Ok((pos, claim)) => (pos.point, *claim),
        Err(_) => return MoveOrder::Unreachable,
    };

    if claim.claimed.is_none() && position.distance(&destination) <= config.arrive_threshold {
        let _ = world.remove_one::<Movement>(entity);
        return MoveOrder::AlreadyThere;
    }

    let grid = &services.grid;
    let (movement, order) =
        match plan_route(grid, position, claim.claimed, destination, via, &HashSet::new()) {
            Some(route) => (
                Movement::new(destination, via, route, config.customer_speed),
                MoveOrder::Moving,
            ),
            None => {
                log::debug!("{:?}: no path from {} to {}, will retry", entity, position, destination);
                (
                    Movement::awaiting_path(
                        destination,
                        via,
                        config.customer_speed,
                        config.repath_interval,
                    ),
                    MoveOrder::Unreachable,
                )
            }
        };
    let _ = world.insert_one(entity, movement);
    order
}

struct StepContext<'a, R: Rng> {
    services: &'a mut CafeServices,
    config: &'a CafeConfig,
    /// Cell each mover was blocked on at the start of this pass
    blocked: &'a HashMap<Entity, Cell>,
    rng: &'a mut R,
    dt: f32,
}

/// Advance every mover by `dt`. Movers are processed in entity-id order,
/// so contested claims resolve the same way on every run.
pub fn movement_system<R: Rng>(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    rng: &mut R,
    dt: f32,
) {
    let mut movers: Vec<Entity> = Vec::new();
    let mut blocked: HashMap<Entity, Cell> = HashMap::new();
    for (entity, movement) in world.query::<&Movement>().iter() {
        movers.push(entity);
        if let Some(cell) = movement.blocked_on {
            blocked.insert(entity, cell);
        }
    }
    movers.sort_by_key(|e| e.id());

    let mut ctx = StepContext {
        services,
        config,
        blocked: &blocked,
        rng,
        dt,
    };
    let mut arrived = Vec::new();
    for entity in movers {
        let Ok((pos, movement, claim)) =
            world.query_one_mut::<(&mut Position, &mut Movement, &mut CellClaim)>(entity)
        else {
            continue;
        };
        if step_mover(entity, pos, movement, claim, &mut ctx) {
            arrived.push(entity);
        }
    }

    // Remove movement - arrived
    for entity in arrived {
        let _ = world.remove_one::<Movement>(entity);
    }
}

/// Returns true once the final waypoint is reached.
fn step_mover<R: Rng>(
    entity: Entity,
    pos: &mut Position,
    movement: &mut Movement,
    claim: &mut CellClaim,
    ctx: &mut StepContext<'_, R>,
) -> bool {
    if movement.is_awaiting_path() {
        retry_unreachable(entity, pos, movement, claim, ctx);
        return false;
    }
    let Some(target) = movement.current_waypoint() else {
        return true;
    };

    let next_cell = ctx.services.grid.world_to_cell(target);
    if claim.occupied != Some(next_cell) && claim.claimed != Some(next_cell) {
        let reservations = &mut ctx.services.reservations;
        if let Some(stale) = claim.claimed.take() {
            reservations.release(stale, entity);
        }
        if !reservations.try_reserve(next_cell, entity) {
            handle_blocked(entity, pos, movement, claim, next_cell, ctx);
            return false;
        }
        claim.claimed = Some(next_cell);
        movement.blocked_on = None;
        movement.retry_timer = 0.0;
    }

    pos.point = pos.point.move_towards(target, movement.speed * ctx.dt);
    if pos.point.distance(&target) > ctx.config.arrive_threshold {
        return false;
    }

    pos.point = target;
    if let Some(entered) = claim.claimed.take() {
        if let Some(left) = claim.occupied {
            if left != entered {
                ctx.services.reservations.release(left, entity);
            }
        }
        claim.occupied = Some(entered);
    }
    movement.path_index += 1;
    movement.path_index >= movement.waypoints.len()
}

fn retry_unreachable<R: Rng>(
    entity: Entity,
    pos: &Position,
    movement: &mut Movement,
    claim: &CellClaim,
    ctx: &mut StepContext<'_, R>,
) {
    movement.repath_timer -= ctx.dt;
    if movement.repath_timer > 0.0 {
        return;
    }
    let grid = &ctx.services.grid;
    match plan_route(
        grid,
        pos.point,
        claim.claimed,
        movement.destination,
        movement.via,
        &HashSet::new(),
    ) {
        Some(route) => {
            log::debug!(
                "{:?}: path to {} found after {} retries",
                entity,
                movement.destination,
                movement.repath_attempts
            );
            movement.set_route(route);
        }
        None => {
            movement.repath_attempts += 1;
            if movement.repath_attempts >= ctx.config.max_repath_attempts {
                log::warn!(
                    "{:?}: no path to {} after {} retries, moving directly",
                    entity,
                    movement.destination,
                    movement.repath_attempts
                );
                movement.set_route(direct_route(grid, claim.claimed, movement.destination));
            } else {
                movement.repath_timer = ctx.config.repath_interval;
            }
        }
    }
}

fn handle_blocked<R: Rng>(
    entity: Entity,
    pos: &Position,
    movement: &mut Movement,
    claim: &CellClaim,
    next_cell: Cell,
    ctx: &mut StepContext<'_, R>,
) {
    let owner = ctx.services.reservations.owner(next_cell);
    movement.blocked_on = Some(next_cell);
    log::trace!("{:?}: blocked on {} by {:?}", entity, next_cell, owner);

    movement.retry_timer -= ctx.dt;
    if movement.retry_timer > 0.0 {
        return;
    }
    movement.retry_timer = ctx.config.reserve_retry_interval;

    // Two movers each waiting for the other's cell: the higher id yields.
    let deadlocked = match (owner, claim.occupied) {
        (Some(other), Some(standing)) => ctx.blocked.get(&other) == Some(&standing),
        _ => false,
    };
    if deadlocked && owner.is_some_and(|other| entity.id() > other.id()) {
        step_aside(entity, movement, claim, next_cell, ctx);
        return;
    }

    if ctx.rng.gen_bool(ctx.config.replan_chance) {
        let grid = &ctx.services.grid;
        let goal = grid.world_to_cell(movement.destination);
        let avoid = held_by_others(&ctx.services.reservations, entity, goal);
        // An empty replan keeps the old route.
        if let Some(route) = plan_route(grid, pos.point, claim.claimed, movement.destination, None, &avoid) {
            log::debug!("{:?}: replanned around {}", entity, next_cell);
            movement.via = None;
            movement.set_route(route);
        }
    }
}

fn step_aside<R: Rng>(
    entity: Entity,
    movement: &mut Movement,
    claim: &CellClaim,
    next_cell: Cell,
    ctx: &mut StepContext<'_, R>,
) {
    let Some(standing) = claim.occupied else {
        return;
    };
    let grid = &ctx.services.grid;
    let reservations = &ctx.services.reservations;
    let Some(side) = grid
        .neighbors(standing)
        .find(|n| *n != next_cell && !reservations.is_reserved(*n))
    else {
        return;
    };

    let side_point = grid.cell_center(side);
    let goal = grid.world_to_cell(movement.destination);
    let mut avoid = held_by_others(reservations, entity, goal);
    avoid.insert(standing);
    let onward = plan_route(grid, side_point, None, movement.destination, None, &avoid)
        .or_else(|| plan_route(grid, side_point, None, movement.destination, None, &HashSet::new()))
        .unwrap_or_else(|| vec![movement.destination]);

    log::debug!("{:?}: stepping aside to {} to let {} clear", entity, side, next_cell);
    movement.via = None;
    movement.set_route(join_paths(vec![side_point], onward));
}
