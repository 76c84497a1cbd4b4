//! Platform abstraction layer
//!
//! Turns host events (key names, pointer positions, clicks) into the
//! deterministic per-tick `TickInput` the simulation consumes.

pub mod input;

pub use input::{InputLatch, MoveKeys};
