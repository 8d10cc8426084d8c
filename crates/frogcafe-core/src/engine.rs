//! Café engine - main entry point for running the simulation

use std::fmt;

use frogcafe_logic::config::{CafeConfig, ConfigError};
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::Cell;
use frogcafe_logic::layout::{LayoutWarning, LevelLayout};
use frogcafe_logic::order::{HeldDrink, Order};
use frogcafe_logic::progress::{DayProgress, ProgressEvent};
use frogcafe_logic::seats::SeatId;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::components::*;
use crate::events::CafeEvent;
use crate::services::CafeServices;
use crate::systems::*;

/// Why a player command was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    NotActive,
    NotFrontOfQueue,
    NotAtCounter,
    OrderAlreadyTaken,
    NotSeated,
    AlreadyServed,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Refusal::NotActive => "customer is not active",
            Refusal::NotFrontOfQueue => "customer is not at the front of the queue",
            Refusal::NotAtCounter => "customer has not reached the counter",
            Refusal::OrderAlreadyTaken => "order was already taken",
            Refusal::NotSeated => "customer is not seated",
            Refusal::AlreadyServed => "customer was already served",
        };
        f.write_str(text)
    }
}

impl std::error::Error for Refusal {}

/// Main simulation engine
pub struct CafeEngine {
    /// ECS world containing every pooled customer
    world: World,
    services: CafeServices,
    config: CafeConfig,
    progress: DayProgress,
    spawner: Spawner,
    rng: ChaCha8Rng,
    events: Vec<CafeEvent>,
    layout_warnings: Vec<LayoutWarning>,
    /// Simulated seconds since creation
    sim_time: f64,
    time_scale: f32,
}

impl CafeEngine {
    /// Build a café from a config and level. Seeded, so two engines built
    /// with the same inputs and fed the same commands behave identically.
    pub fn new(config: CafeConfig, layout: &LevelLayout, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        // Warnings were logged by layout validation
        let (services, layout_warnings) = CafeServices::from_layout(layout, &config)?;

        let mut world = World::new();
        let spawner = Spawner::new(&mut world, services.spawn_point, config.spawn.pool_size);
        log::info!(
            "Café ready: {} walkable cells, {} seats, {} queue points, pool of {}",
            services.grid.walkable_count(),
            services.seats.len(),
            layout.queue_points.len(),
            config.spawn.pool_size
        );

        Ok(Self {
            world,
            services,
            progress: DayProgress::new(&config.days),
            spawner,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
            layout_warnings,
            sim_time: 0.0,
            time_scale: 1.0,
            config,
        })
    }

    /// Default tuning on the built-in level.
    pub fn demo(seed: u64) -> Result<Self, ConfigError> {
        Self::new(CafeConfig::default(), &LevelLayout::demo(), seed)
    }

    // ── Commands ──

    /// Clear everything and begin day 1.
    pub fn start_run(&mut self) {
        self.progress.start_run();
        self.process_progress_events();
    }

    /// Advance the simulation by `delta_seconds`.
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = delta_seconds * self.time_scale;
        if dt <= 0.0 {
            return;
        }
        self.sim_time += dt as f64;

        self.progress.tick(dt);
        self.process_progress_events();

        if self.progress.is_running() {
            spawning_system(
                &mut self.world,
                &mut self.services,
                &self.config,
                &mut self.spawner,
                &mut self.rng,
                &mut self.events,
                dt,
            );
        }

        movement_system(&mut self.world, &mut self.services, &self.config, &mut self.rng, dt);

        lifecycle_system(
            &mut self.world,
            &mut self.services,
            &self.config,
            &mut self.progress,
            &mut self.events,
            dt,
        );
        departure_system(&mut self.world, &mut self.services, &self.config, &mut self.events);

        self.process_progress_events();
    }

    /// Spawn a customer now, outside the spawn schedule.
    pub fn spawn_customer(&mut self) -> Option<Entity> {
        create_customer(
            &mut self.world,
            &mut self.services,
            &self.config,
            &mut self.spawner,
            &mut self.rng,
            &mut self.events,
        )
    }

    /// Take the order of the customer waiting at the counter.
    pub fn request_order_taken(&mut self, customer: Entity) -> Result<(), Refusal> {
        let current = self.active_customer(customer)?;
        if current.order_taken {
            return Err(Refusal::OrderAlreadyTaken);
        }
        if !self.services.queue.is_front(customer) {
            return Err(Refusal::NotFrontOfQueue);
        }
        let at_counter = self
            .customer_position(customer)
            .is_some_and(|p| self.services.at_counter(p, self.config.counter_tolerance));
        if !at_counter {
            return Err(Refusal::NotAtCounter);
        }

        if let Ok(mut c) = self.world.get::<&mut Customer>(customer) {
            c.order_taken = true;
        }
        let _ = self.world.remove_one::<Movement>(customer);
        let assignments = self.services.queue.remove(customer);
        apply_queue_assignments(&mut self.world, &self.services, &self.config, &assignments);
        set_state(&mut self.world, customer, CustomerState::AssigningSeat);

        log::debug!("Customer #{}: order taken ({})", current.serial, current.order);
        self.events.push(CafeEvent::OrderTaken { customer });
        Ok(())
    }

    /// Mark a seated customer as served.
    pub fn request_served(&mut self, customer: Entity, mode: ServeMode) -> Result<(), Refusal> {
        let current = self.active_customer(customer)?;
        if current.served {
            return Err(Refusal::AlreadyServed);
        }
        if current.state != CustomerState::Seated {
            return Err(Refusal::NotSeated);
        }

        if let Ok(mut c) = self.world.get::<&mut Customer>(customer) {
            c.served = true;
            if mode == ServeMode::Normal {
                c.linger = Some(self.config.served_linger);
            }
        }
        log::debug!("Customer #{} served ({:?})", current.serial, mode);
        self.events.push(CafeEvent::CustomerServed { customer, mode });
        self.progress.register_served();

        if mode == ServeMode::Forced {
            begin_leaving(
                &mut self.world,
                &mut self.services,
                &self.config,
                &mut self.progress,
                &mut self.events,
                customer,
                LeaveReason::Served,
            );
        }
        self.process_progress_events();
        Ok(())
    }

    /// Hand the held drink to a seated customer. Serves them and returns
    /// `Ok(true)` only when it matches their order.
    pub fn offer_drink(
        &mut self,
        customer: Entity,
        drink: &HeldDrink,
        mode: ServeMode,
    ) -> Result<bool, Refusal> {
        let current = self.active_customer(customer)?;
        if current.served {
            return Err(Refusal::AlreadyServed);
        }
        if current.state != CustomerState::Seated {
            return Err(Refusal::NotSeated);
        }
        match drink.as_order() {
            Some(offered) if offered.matches(&current.order) => {
                self.request_served(customer, mode)?;
                Ok(true)
            }
            _ => {
                log::debug!("Customer #{} refused the drink", current.serial);
                Ok(false)
            }
        }
    }

    /// Return a customer to the pool immediately, from any state.
    pub fn remove_customer(&mut self, customer: Entity) -> bool {
        if self.active_customer(customer).is_err() {
            return false;
        }
        deactivate_customer(
            &mut self.world,
            &mut self.services,
            &self.config,
            &mut self.events,
            customer,
        );
        true
    }

    /// Clear every customer and restart the current day's spawn schedule.
    pub fn reset_day(&mut self) {
        self.reset_customers();
        self.spawner
            .start_day(self.progress.needed_today(), self.config.spawn.interval);
    }

    /// End the current day as if its quota had been met.
    pub fn force_end_day(&mut self) {
        self.progress.force_end_day();
        self.process_progress_events();
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    fn reset_customers(&mut self) {
        for customer in self.active_customers() {
            deactivate_customer(
                &mut self.world,
                &mut self.services,
                &self.config,
                &mut self.events,
                customer,
            );
        }
        self.services.clear();
    }

    fn process_progress_events(&mut self) {
        for event in self.progress.drain_events() {
            self.events.push(CafeEvent::Progress(event));
            match event {
                ProgressEvent::ResetAll => self.reset_customers(),
                ProgressEvent::DayStarted(day) => {
                    let quota = self.progress.customers_required(day);
                    self.spawner.start_day(quota, self.config.spawn.interval);
                }
                ProgressEvent::DayEnded(_)
                | ProgressEvent::ServedChanged { .. }
                | ProgressEvent::GameOver(_) => {}
            }
        }
    }

    fn active_customer(&self, customer: Entity) -> Result<Customer, Refusal> {
        match self.world.get::<&Customer>(customer) {
            Ok(c) if c.state.is_active() => Ok((*c).clone()),
            _ => Err(Refusal::NotActive),
        }
    }

    // ── Queries ──

    pub fn front_of_queue(&self) -> Option<Entity> {
        self.services.queue.front()
    }

    /// Queue members, front first.
    pub fn queue_order(&self) -> Vec<Entity> {
        self.services.queue.iter().collect()
    }

    pub fn customer(&self, customer: Entity) -> Option<Customer> {
        self.world.get::<&Customer>(customer).ok().map(|c| (*c).clone())
    }

    pub fn customer_state(&self, customer: Entity) -> Option<CustomerState> {
        self.world.get::<&Customer>(customer).ok().map(|c| c.state)
    }

    pub fn customer_order(&self, customer: Entity) -> Option<Order> {
        self.world.get::<&Customer>(customer).ok().map(|c| c.order)
    }

    pub fn customer_position(&self, customer: Entity) -> Option<Vec2> {
        self.world.get::<&Position>(customer).ok().map(|p| p.point)
    }

    pub fn customer_seat(&self, customer: Entity) -> Option<SeatId> {
        self.world.get::<&Customer>(customer).ok().and_then(|c| c.seat)
    }

    /// Cells a customer currently holds: where it stands and, while
    /// stepping, the cell it is entering.
    pub fn customer_cells(&self, customer: Entity) -> Vec<Cell> {
        self.world
            .get::<&CellClaim>(customer)
            .map(|claim| claim.cells().collect())
            .unwrap_or_default()
    }

    /// Active customers in entity-id order.
    pub fn active_customers(&self) -> Vec<Entity> {
        let mut active: Vec<Entity> = self
            .world
            .query::<&Customer>()
            .iter()
            .filter(|(_, c)| c.state.is_active())
            .map(|(e, _)| e)
            .collect();
        active.sort_by_key(|e| e.id());
        active
    }

    pub fn active_customer_count(&self) -> usize {
        self.world
            .query::<&Customer>()
            .iter()
            .filter(|(_, c)| c.state.is_active())
            .count()
    }

    pub fn seats_occupied(&self) -> usize {
        self.services.seats.occupied_count()
    }

    pub fn reservation_owner(&self, cell: Cell) -> Option<Entity> {
        self.services.reservations.owner(cell)
    }

    /// Simulated seconds since creation
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn progress(&self) -> &DayProgress {
        &self.progress
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn config(&self) -> &CafeConfig {
        &self.config
    }

    pub fn services(&self) -> &CafeServices {
        &self.services
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn layout_warnings(&self) -> &[LayoutWarning] {
        &self.layout_warnings
    }

    /// Take every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<CafeEvent> {
        std::mem::take(&mut self.events)
    }
}
