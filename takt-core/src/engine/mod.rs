//! Cycle engine
//!
//! The per-tick phase step and the start-edge decision. Both run on a
//! `&mut CycleContext`, i.e. inside [`crate::SharedCycleState::with_lock`],
//! and return an outcome the caller reports once the lock is released.

pub mod start;
pub mod tick;

pub use start::{StartDecision, StartGate};
pub use tick::{CycleEngine, TickOutcome};
