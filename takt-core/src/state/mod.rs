//! Cycle phase state machine
//!
//! Defines the authoritative phase model of one production cycle.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod phase;

pub use events::CycleEvent;
pub use phase::CyclePhase;
