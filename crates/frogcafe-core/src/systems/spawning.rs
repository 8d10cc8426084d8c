//! Customer spawning from a fixed entity pool.

use frogcafe_logic::config::CafeConfig;
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::order::Order;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{CellClaim, Customer, Movement, Position};
use crate::events::CafeEvent;
use crate::services::CafeServices;

/// Owns the customer pool and the per-day spawn schedule.
#[derive(Debug, Clone)]
pub struct Spawner {
    pool: Vec<Entity>,
    interval: f32,
    timer: f32,
    spawned_today: u32,
    quota: u32,
    next_serial: u32,
}

impl Spawner {
    /// Allocate `pool_size` inactive customers parked at `park_at`.
    pub fn new(world: &mut World, park_at: Vec2, pool_size: usize) -> Self {
        let pool = (0..pool_size)
            .map(|_| world.spawn((Position::new(park_at), CellClaim::default(), Customer::pooled())))
            .collect();
        Self {
            pool,
            interval: 0.0,
            timer: 0.0,
            spawned_today: 0,
            quota: 0,
            next_serial: 0,
        }
    }

    /// Reset the schedule for a new day. The first spawn comes one
    /// interval after the day starts.
    pub fn start_day(&mut self, quota: u32, interval: f32) {
        self.quota = quota;
        self.spawned_today = 0;
        self.interval = interval;
        self.timer = interval;
    }

    pub fn pool(&self) -> &[Entity] {
        &self.pool
    }

    pub fn spawned_today(&self) -> u32 {
        self.spawned_today
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }
}

/// Activate one pooled customer at the spawn point.
///
/// Returns `None` when the pool is exhausted or the spawn cell is held by
/// someone else; the caller can try again later.
pub fn create_customer<R: Rng>(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    spawner: &mut Spawner,
    rng: &mut R,
    events: &mut Vec<CafeEvent>,
) -> Option<Entity> {
    let Some(entity) = spawner
        .pool
        .iter()
        .copied()
        .find(|e| world.get::<&Customer>(*e).is_ok_and(|c| !c.state.is_active()))
    else {
        log::warn!("Customer pool exhausted ({} entities)", spawner.pool.len());
        return None;
    };

    let spawn_point = services.spawn_point;
    let spawn_cell = services.grid.world_to_cell(spawn_point);
    if !services.reservations.try_reserve(spawn_cell, entity) {
        log::debug!("Spawn cell {} is busy, postponing", spawn_cell);
        return None;
    }

    spawner.next_serial += 1;
    let order = Order::random(rng, &config.orders);
    let customer = Customer::spawned(spawner.next_serial, order, config.patience);
    let _ = world.remove_one::<Movement>(entity);
    if world
        .insert(entity, (Position::new(spawn_point), CellClaim::standing(spawn_cell), customer))
        .is_err()
    {
        services.reservations.release(spawn_cell, entity);
        return None;
    }

    spawner.spawned_today += 1;
    log::debug!("Customer #{} spawned, wants {}", spawner.next_serial, order);
    events.push(CafeEvent::CustomerSpawned {
        customer: entity,
        order,
    });
    Some(entity)
}

/// Spawn on a fixed interval while under the day's quota and the active cap.
pub fn spawning_system<R: Rng>(
    world: &mut World,
    services: &mut CafeServices,
    config: &CafeConfig,
    spawner: &mut Spawner,
    rng: &mut R,
    events: &mut Vec<CafeEvent>,
    dt: f32,
) {
    spawner.timer -= dt;
    if spawner.timer > 0.0 {
        return;
    }
    spawner.timer += spawner.interval;
    if spawner.timer <= 0.0 {
        spawner.timer = spawner.interval;
    }

    if spawner.spawned_today >= spawner.quota {
        return;
    }
    let active = world
        .query::<&Customer>()
        .iter()
        .filter(|(_, c)| c.state.is_active())
        .count();
    if active >= config.spawn.max_active {
        return;
    }
    create_customer(world, services, config, spawner, rng, events);
}
