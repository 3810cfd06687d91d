//! Cycle context and completed-cycle log
//!
//! The context is the one piece of mutable state shared by the engine, the
//! edge handlers, and the reporting façade.

pub mod context;
pub mod log;

pub use context::{Anomalies, CycleContext, ProductChange};
pub use log::{CycleLog, CycleLogEntry, LogSummary};
