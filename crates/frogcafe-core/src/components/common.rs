//! Spatial components shared by every mover.

use frogcafe_logic::geometry::Vec2;
use frogcafe_logic::grid::Cell;
use serde::{Deserialize, Serialize};

/// World-space position of an entity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub point: Vec2,
}

impl Position {
    pub fn new(point: Vec2) -> Self {
        Self { point }
    }
}

/// Active path following. Present only while the entity has somewhere to
/// go; the movement system removes it on arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Exact final point
    pub destination: Vec2,
    /// Optional intermediate point the route passes through
    pub via: Option<Vec2>,
    /// Remaining route; empty while waiting for a path to become available
    pub waypoints: Vec<Vec2>,
    pub path_index: usize,
    pub speed: f32,
    /// Cell whose reservation failed on the last attempt
    pub blocked_on: Option<Cell>,
    /// Countdown to the next contention retry
    pub retry_timer: f32,
    /// Countdown to the next attempt at an unreachable destination
    pub repath_timer: f32,
    pub repath_attempts: u32,
}

impl Movement {
    pub fn new(destination: Vec2, via: Option<Vec2>, waypoints: Vec<Vec2>, speed: f32) -> Self {
        Self {
            destination,
            via,
            waypoints,
            path_index: 0,
            speed,
            blocked_on: None,
            retry_timer: 0.0,
            repath_timer: 0.0,
            repath_attempts: 0,
        }
    }

    /// Movement that waits `repath_interval` before asking for a path again.
    pub fn awaiting_path(destination: Vec2, via: Option<Vec2>, speed: f32, repath_interval: f32) -> Self {
        Self {
            repath_timer: repath_interval,
            ..Self::new(destination, via, Vec::new(), speed)
        }
    }

    pub fn is_awaiting_path(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.path_index).copied()
    }

    /// Replace the route and restart from its first waypoint.
    pub fn set_route(&mut self, waypoints: Vec<Vec2>) {
        self.waypoints = waypoints;
        self.path_index = 0;
        self.blocked_on = None;
    }
}

/// Cells held in the reservation table: the one the entity stands in and
/// at most one claimed cell ahead of it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CellClaim {
    pub occupied: Option<Cell>,
    pub claimed: Option<Cell>,
}

impl CellClaim {
    pub fn standing(cell: Cell) -> Self {
        Self {
            occupied: Some(cell),
            claimed: None,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        self.occupied.into_iter().chain(self.claimed)
    }
}
