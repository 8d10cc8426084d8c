//! Systems - logic that operates on components

mod movement;
mod lifecycle;
mod spawning;

pub use movement::*;
pub use lifecycle::*;
pub use spawning::*;
