//! Clamp-closing watchdog
//!
//! Armed when a start is latched. Expired once the monotonic clock is
//! strictly past the deadline.

use embassy_time::{Duration, Instant};

use crate::config::TimingConfig;

/// Watchdog state at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogStatus {
    /// No deadline set
    Disarmed,
    Running { remaining: Duration },
    Expired { overrun: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampWatchdog {
    timeout: Duration,
}

impl ClampWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.clamp_timeout())
    }

    /// Deadline for a start latched at `now`
    pub fn arm(&self, now: Instant) -> Instant {
        now + self.timeout
    }

    pub fn status(&self, deadline: Option<Instant>, now: Instant) -> WatchdogStatus {
        match deadline {
            None => WatchdogStatus::Disarmed,
            Some(deadline) if now > deadline => WatchdogStatus::Expired {
                overrun: now - deadline,
            },
            Some(deadline) => WatchdogStatus::Running {
                remaining: deadline - now,
            },
        }
    }
}

impl Default for ClampWatchdog {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}
