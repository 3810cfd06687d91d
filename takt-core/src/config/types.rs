//! Cycle configuration types

use core::fmt;

use embassy_time::Duration;

use super::hardware::{LineMap, LineMapError};
use crate::signal::{Signal, SignalSet};

/// Engine tick period
pub const DEFAULT_TICK_MS: u32 = 50;

/// Clamp-closing deadline after a start is latched
pub const DEFAULT_CLAMP_TIMEOUT_S: u32 = 60;

/// Upstream debounce window for start switch and reset button
pub const DEFAULT_DEBOUNCE_MS: u32 = 200;

/// Bound on waiting for the engine to stop
pub const DEFAULT_STOP_TIMEOUT_MS: u32 = 2000;

/// Input sampling period for polling adapters
pub const DEFAULT_SAMPLE_MS: u32 = 5;

/// Timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Engine tick period (ms)
    pub tick_ms: u32,
    /// Clamp-closing timeout (s)
    pub clamp_timeout_s: u32,
    /// Edge debounce window (ms)
    pub debounce_ms: u32,
    /// How long `stop` waits for the engine (ms)
    pub stop_timeout_ms: u32,
    /// Adapter sampling period (ms)
    pub sample_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            clamp_timeout_s: DEFAULT_CLAMP_TIMEOUT_S,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            sample_ms: DEFAULT_SAMPLE_MS,
        }
    }
}

impl TimingConfig {
    /// Clamp-closing deadline on the monotonic clock
    pub fn clamp_timeout(&self) -> Duration {
        Duration::from_secs(self.clamp_timeout_s as u64)
    }

    /// Engine sleep between ticks (thread wait)
    pub fn tick_period(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.tick_ms as u64)
    }

    /// Bound on waiting for the engine thread (thread wait)
    pub fn stop_timeout(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.stop_timeout_ms as u64)
    }
}

/// Start interlock: signals that must all be active before a start is honoured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterlockConfig {
    pub start_requires: SignalSet,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        let mut start_requires = SignalSet::new();
        for signal in Signal::MACHINE_READY {
            let _ = start_requires.push(signal);
        }
        Self { start_requires }
    }
}

/// Configuration problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    /// Line map is inconsistent
    Lines(LineMapError),
    /// Tick period of zero
    ZeroTick,
    /// Clamp timeout of zero
    ZeroClampTimeout,
    /// Interlock requires nothing
    EmptyInterlock,
    /// Interlock names a signal that is neither a clamp nor a machine-ready line
    InterlockSignal(Signal),
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::Lines(e) => write!(f, "{}", e),
            ConfigIssue::ZeroTick => f.write_str("tick_ms must be greater than zero"),
            ConfigIssue::ZeroClampTimeout => {
                f.write_str("clamp_timeout_s must be greater than zero")
            }
            ConfigIssue::EmptyInterlock => f.write_str("start interlock requires no signals"),
            ConfigIssue::InterlockSignal(s) => {
                write!(f, "{} cannot be part of the start interlock", s)
            }
        }
    }
}

impl From<LineMapError> for ConfigIssue {
    fn from(e: LineMapError) -> Self {
        ConfigIssue::Lines(e)
    }
}

/// Complete cycle monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleConfig {
    pub lines: LineMap,
    pub timing: TimingConfig,
    pub interlock: InterlockConfig,
}

impl CycleConfig {
    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigIssue> {
        self.lines.validate()?;

        if self.timing.tick_ms == 0 {
            return Err(ConfigIssue::ZeroTick);
        }
        if self.timing.clamp_timeout_s == 0 {
            return Err(ConfigIssue::ZeroClampTimeout);
        }

        if self.interlock.start_requires.is_empty() {
            return Err(ConfigIssue::EmptyInterlock);
        }
        if let Some(&bad) = self
            .interlock
            .start_requires
            .iter()
            .find(|s| !(s.is_machine_ready() || s.is_clamp()))
        {
            return Err(ConfigIssue::InterlockSignal(bad));
        }

        Ok(())
    }
}
