//! Pure simulation logic for FrogCafe.
//!
//! This crate contains the café's customer-flow logic independent of any
//! ECS, engine, or renderer. Functions take plain data and return results,
//! making them unit-testable and reusable from the `hecs` engine in
//! `frogcafe-core`, the headless harness, and any future front end.
//!
//! Shared-resource services are generic over the handle type of the thing
//! that owns a resource (`M` for movers, `C` for customers), so the same
//! code arbitrates `hecs::Entity` handles in the engine and plain integers
//! in tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Tuning values (speeds, timers, spawn limits, day quotas) |
//! | [`geometry`] | `Vec2` world-space points and vector math |
//! | [`grid`] | Cell ↔ world conversion, walkability, cardinal neighbors |
//! | [`layout`] | Level layout data (ASCII floor plan, counter, queue, seats) |
//! | [`order`] | Drink orders, random order rolls, held-drink assembly |
//! | [`pathfinding`] | A* over the tile grid, seat detour waypoint |
//! | [`progress`] | Day-based level progression, day timer, run outcome |
//! | [`queue`] | FIFO queue coordinator with rank → position mapping |
//! | [`reservation`] | Single-owner cell reservation table |
//! | [`seats`] | Seat registry with first-free allocation |

pub mod config;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod order;
pub mod pathfinding;
pub mod progress;
pub mod queue;
pub mod reservation;
pub mod seats;
