//! Completed-cycle log

use embassy_time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One completed cycle
///
/// Entries are immutable once appended.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CycleLogEntry {
    /// Wall-clock time the start was latched
    pub start_display: String,
    /// Wall-clock time the product was released
    pub end_display: String,
    /// Monotonic start-to-release time, millisecond precision
    pub duration_seconds: f64,
    /// Product the cycle belonged to
    pub product_id: String,
}

impl CycleLogEntry {
    pub fn new(
        start_display: String,
        end_display: String,
        duration: Duration,
        product_id: String,
    ) -> Self {
        Self {
            start_display,
            end_display,
            duration_seconds: seconds_rounded_to_millis(duration),
            product_id,
        }
    }
}

/// Convert a duration to seconds rounded to the nearest millisecond
pub fn seconds_rounded_to_millis(duration: Duration) -> f64 {
    let millis = (duration.as_micros() + 500) / 1000;
    millis as f64 / 1000.0
}

/// Aggregate view of the log
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogSummary {
    /// Number of logged cycles
    pub quantity: usize,
    /// Start of the first logged cycle
    pub first_start: Option<String>,
    /// End of the last logged cycle
    pub last_end: Option<String>,
    /// Mean cycle time (0.0 when empty)
    pub average_cycle_seconds: f64,
}

/// Ordered sequence of completed cycles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleLog {
    entries: Vec<CycleLogEntry>,
}

impl CycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CycleLogEntry) {
        self.entries.push(entry);
    }

    /// Drop every entry, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.entries.len();
        self.entries.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CycleLogEntry] {
        &self.entries
    }

    /// Mean of recorded durations, 0.0 when empty
    pub fn average_seconds(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: f64 = self.entries.iter().map(|e| e.duration_seconds).sum();
        total / self.entries.len() as f64
    }

    pub fn summary(&self) -> LogSummary {
        LogSummary {
            quantity: self.entries.len(),
            first_start: self.entries.first().map(|e| e.start_display.clone()),
            last_end: self.entries.last().map(|e| e.end_display.clone()),
            average_cycle_seconds: self.average_seconds(),
        }
    }
}
