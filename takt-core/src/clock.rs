//! Time sources
//!
//! Cycle durations are measured on a monotonic clock. The wall clock is only
//! used to render human-readable timestamps for the log.

use core::sync::atomic::{AtomicU64, Ordering};

use embassy_time::{Duration, Instant};

/// One reading of both clocks
///
/// Taken before the cycle lock is acquired so that no clock access (chrono
/// may consult the zone database) happens inside the critical section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub at: Instant,
    pub display: String,
}

/// Monotonic time plus a wall-clock rendering for display
pub trait Clock: Send + Sync {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Current wall-clock time as `HH:MM:SS.mmm`
    fn wall_display(&self) -> String;

    fn stamp(&self) -> Stamp {
        Stamp {
            at: self.now(),
            display: self.wall_display(),
        }
    }
}

/// Host clocks: embassy-time's std driver and chrono's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_display(&self) -> String {
        chrono::Local::now().format("%H:%M:%S%.3f").to_string()
    }
}

/// Hand-driven clock for tests and simulation
///
/// Starts at zero. The wall display is the elapsed time formatted as a time
/// of day, so `advance(Duration::from_secs(5))` displays `00:00:05.000`.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(by.as_micros(), Ordering::SeqCst);
    }

    pub fn set(&self, at: Instant) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.micros.load(Ordering::SeqCst))
    }

    fn wall_display(&self) -> String {
        let millis = self.micros.load(Ordering::SeqCst) / 1000;
        let (secs, ms) = (millis / 1000, millis % 1000);
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            (secs / 3600) % 24,
            (secs / 60) % 60,
            secs % 60,
            ms
        )
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall_display(&self) -> String {
        (**self).wall_display()
    }
}
