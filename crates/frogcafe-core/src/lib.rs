//! FrogCafe Core - café customer-flow simulation engine
//!
//! Customers spawn at the door, queue at the counter, wait for the player
//! to take their order, walk to a free seat and wait for the right drink.
//! Every visit is driven by a per-customer state machine on top of shared
//! services that arbitrate grid cells, queue ranks and seats.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Pooled customers, recycled between visits
//! - **Components**: Pure data attached to entities (Position, Movement, Customer, etc.)
//! - **Systems**: Logic that queries and updates components
//! - **Services**: Grid, reservations, queue and seats, owned by the engine
//!
//! # Example
//!
//! ```rust,no_run
//! use frogcafe_core::prelude::*;
//!
//! let mut engine = CafeEngine::demo(42).unwrap();
//! engine.start_run();
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     if let Some(front) = engine.front_of_queue() {
//!         let _ = engine.request_order_taken(front);
//!     }
//!     for event in engine.drain_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod components;
pub mod systems;
pub mod services;
pub mod events;
pub mod engine;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{CafeEngine, Refusal};
    pub use crate::events::CafeEvent;
    pub use frogcafe_logic::order::{HeldDrink, Ingredient, Order};
}
