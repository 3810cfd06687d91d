//! Board-agnostic core logic for the production cycle monitor
//!
//! This crate contains all cycle logic that does not depend on a specific
//! input backend:
//!
//! - Signal names and line mapping
//! - Cycle phase state machine
//! - Shared cycle context and completed-cycle log
//! - Start interlock and clamp-closing watchdog
//! - Per-tick engine step and start-edge decision
//! - The single lock every actor goes through

#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod safety;
pub mod shared;
pub mod signal;
pub mod state;

pub use clock::{Clock, ManualClock, Stamp, SystemClock};
pub use config::{CycleConfig, LineMap, PinConfig};
pub use cycle::{Anomalies, CycleContext, CycleLogEntry, ProductChange};
pub use engine::{CycleEngine, StartDecision, StartGate, TickOutcome};
pub use shared::SharedCycleState;
pub use signal::{Signal, SignalSet};
pub use state::CyclePhase;
