//! Customer lifecycle components.

use frogcafe_logic::order::{CupType, Order, TeaType};
use frogcafe_logic::seats::SeatId;
use serde::{Deserialize, Serialize};

/// Where a customer is in its visit.
///
/// ```text
/// Inactive → Spawned → TravelingToCounter ─┬→ AwaitingOrder → AssigningSeat → TravelingToSeat → Seated → Leaving → Inactive
///                                          └→ Enrolled ──────↗        │
///                                                ↑____________________┘ (no free seat)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerState {
    /// Parked in the pool
    Inactive,
    Spawned,
    TravelingToCounter,
    /// In the queue, walking to or standing at its rank's position
    Enrolled,
    /// Front of queue and standing at the counter
    AwaitingOrder,
    /// Order taken; looking for a free seat this tick
    AssigningSeat,
    TravelingToSeat,
    Seated,
    Leaving(LeaveReason),
}

impl CustomerState {
    pub fn is_active(&self) -> bool {
        !matches!(self, CustomerState::Inactive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CustomerState::Inactive => "Inactive",
            CustomerState::Spawned => "Spawned",
            CustomerState::TravelingToCounter => "TravelingToCounter",
            CustomerState::Enrolled => "Enrolled",
            CustomerState::AwaitingOrder => "AwaitingOrder",
            CustomerState::AssigningSeat => "AssigningSeat",
            CustomerState::TravelingToSeat => "TravelingToSeat",
            CustomerState::Seated => "Seated",
            CustomerState::Leaving(LeaveReason::Served) => "Leaving(Served)",
            CustomerState::Leaving(LeaveReason::Impatient) => "Leaving(Impatient)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveReason {
    /// Got the right drink
    Served,
    /// Patience ran out while seated; fails the run
    Impatient,
}

/// How a successful serve ends the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServeMode {
    /// Linger briefly at the seat, then leave
    Normal,
    /// Leave immediately
    Forced,
}

/// Customer data. Entities are pooled, so every field is reset on spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub state: CustomerState,
    /// Running spawn counter, for logs and display
    pub serial: u32,
    pub order: Order,
    pub order_taken: bool,
    pub served: bool,
    pub seat: Option<SeatId>,
    /// Queue rank held when leaving the line for a seat
    pub prior_rank: usize,
    /// Seconds left before a seated, unserved customer gives up
    pub patience: f32,
    /// Seconds left before a served customer gets up
    pub linger: Option<f32>,
}

impl Customer {
    pub fn pooled() -> Self {
        Self {
            state: CustomerState::Inactive,
            serial: 0,
            order: Order::new(CupType::Mug, TeaType::Empty),
            order_taken: false,
            served: false,
            seat: None,
            prior_rank: 0,
            patience: 0.0,
            linger: None,
        }
    }

    /// Fresh visit with the given order.
    pub fn spawned(serial: u32, order: Order, patience: f32) -> Self {
        Self {
            state: CustomerState::Spawned,
            serial,
            order,
            patience,
            ..Self::pooled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_resets_visit_fields() {
        let order = Order::new(CupType::Glass, TeaType::Blue).with_ice();
        let c = Customer::spawned(4, order, 8.0);
        assert_eq!(c.state, CustomerState::Spawned);
        assert!(c.state.is_active());
        assert!(!c.order_taken && !c.served);
        assert_eq!(c.seat, None);
        assert_eq!(c.order, order);
        assert!(!Customer::pooled().state.is_active());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(
            CustomerState::Leaving(LeaveReason::Impatient).name(),
            "Leaving(Impatient)"
        );
        assert_eq!(CustomerState::AwaitingOrder.name(), "AwaitingOrder");
    }
}
