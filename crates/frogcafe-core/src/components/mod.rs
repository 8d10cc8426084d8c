//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to customer entities.
//! They have no behavior - that lives in systems.

mod common;
mod customer;

pub use common::*;
pub use customer::*;
