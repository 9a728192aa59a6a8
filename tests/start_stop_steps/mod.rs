//! Step definitions for start/stop behaviour scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
