//! Outgoing notifications for presentation layers.

use frogcafe_logic::order::Order;
use frogcafe_logic::progress::ProgressEvent;
use frogcafe_logic::seats::SeatId;
use hecs::Entity;

use crate::components::{LeaveReason, ServeMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CafeEvent {
    CustomerSpawned { customer: Entity, order: Order },
    OrderTaken { customer: Entity },
    CustomerSeated { customer: Entity, seat: SeatId },
    CustomerServed { customer: Entity, mode: ServeMode },
    CustomerLeaving { customer: Entity, reason: LeaveReason },
    /// Returned to the pool, either after walking out or by a reset/removal.
    CustomerDeparted { customer: Entity },
    Progress(ProgressEvent),
}
