//! Production cycle monitor
//!
//! Runs the cycle engine against a bank of digital inputs and exposes the
//! reporting façade the HTTP layer talks to.
//!
//! ```text
//! ┌──────────────┐  rising edges   ┌──────────────────────┐
//! │ input bank   │ ──────────────▶ │ edge handlers        │──┐
//! │ (sysfs/sim)  │ ◀── levels ───┐ └──────────────────────┘  │
//! └──────────────┘               │ ┌──────────────────────┐  │  with_lock
//!                                ├─│ engine thread        │──┼──────────▶ SharedCycleState
//!                                │ └──────────────────────┘  │
//!                                │ ┌──────────────────────┐  │
//!                                └─│ CycleMonitor façade  │──┘
//!                                  └──────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod stats;
pub mod tasks;

pub use controller::{CycleMonitor, SharedInputs};
pub use error::{ConfigError, LoggingError, MonitorError};
pub use monitor::Monitor;
pub use stats::{CycleStats, LineReading, PhaseReport};
pub use tasks::EngineExit;
