//! Start interlock and clamp-closing watchdog

pub mod interlock;
pub mod watchdog;

pub use interlock::{Interlock, InterlockStatus};
pub use watchdog::{ClampWatchdog, WatchdogStatus};
