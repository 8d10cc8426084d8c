//! Shared café services.
//!
//! One instance of each shared mutable structure, owned by the engine and
//! passed by reference into systems. Customer code only touches these
//! through their methods.

use frogcafe_logic::config::{CafeConfig, ConfigError};
use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::TileGrid;
use frogcafe_logic::layout::{LayoutWarning, LevelLayout};
use frogcafe_logic::queue::QueueCoordinator;
use frogcafe_logic::reservation::ReservationTable;
use frogcafe_logic::seats::SeatRegistry;
use hecs::Entity;

pub struct CafeServices {
    pub grid: TileGrid,
    pub reservations: ReservationTable<Entity>,
    pub queue: QueueCoordinator<Entity>,
    pub seats: SeatRegistry<Entity>,
    pub spawn_point: Vec2,
    pub counter_point: Vec2,
    pub exit_point: Vec2,
}

impl CafeServices {
    /// Build every service from a level layout. Layout problems that still
    /// leave a playable café are returned as warnings.
    pub fn from_layout(
        layout: &LevelLayout,
        config: &CafeConfig,
    ) -> Result<(Self, Vec<LayoutWarning>), ConfigError> {
        let grid = layout.build_grid()?;
        let warnings = layout.validate(&grid);
        let services = Self {
            reservations: ReservationTable::new(),
            queue: QueueCoordinator::new(
                layout.counter,
                layout.queue_points.clone(),
                config.fallback_queue_spacing,
            ),
            seats: SeatRegistry::new(&layout.seats),
            spawn_point: layout.spawn,
            counter_point: layout.counter,
            exit_point: layout.exit_point(),
            grid,
        };
        Ok((services, warnings))
    }

    /// Drop all dynamic state: reservations, the queue, seat occupancy.
    pub fn clear(&mut self) {
        self.reservations.clear();
        self.queue.clear();
        self.seats.clear();
    }

    /// Whether `point` is close enough to the counter to order.
    pub fn at_counter(&self, point: Vec2, tolerance: f32) -> bool {
        point.distance(&self.counter_point) <= tolerance
    }
}
