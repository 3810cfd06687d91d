//! Shared cycle context
//!
//! Holds the current phase, the in-flight cycle's timing, the active product,
//! and the completed-cycle log. A `&mut CycleContext` is only ever handed out
//! by [`crate::SharedCycleState::with_lock`], so every method taking
//! `&mut self` here runs with the cycle lock held.

use embassy_time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::log::{CycleLog, CycleLogEntry};
use crate::state::{CycleEvent, CyclePhase};

/// Anomaly counters
///
/// None of these are errors to callers; they exist for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anomalies {
    /// Clamp-closing deadline exceeded
    pub clamp_timeouts: u32,
    /// Start edges refused (wrong phase, interlock open, no product)
    pub rejected_starts: u32,
    /// Latched starts cleared by the engine because no product was active
    pub abandoned_starts: u32,
    /// Releases seen without a recorded start or product
    pub unlogged_releases: u32,
}

/// Result of setting the active product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductChange {
    /// Same product already active; nothing touched
    Unchanged,
    /// New product; log and in-flight cycle discarded
    Switched {
        previous: Option<String>,
        discarded_logs: usize,
    },
}

/// The mutable record every actor shares
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    phase: CyclePhase,
    active_product: Option<String>,
    cycle_start: Option<Instant>,
    cycle_start_display: Option<String>,
    phase_deadline: Option<Instant>,
    log: CycleLog,
    anomalies: Anomalies,
}

impl CycleContext {
    /// Fresh context: waiting for start, no product, empty log
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn active_product(&self) -> Option<&str> {
        self.active_product.as_deref()
    }

    /// Monotonic time the current start was latched
    pub fn cycle_start(&self) -> Option<Instant> {
        self.cycle_start
    }

    /// Wall-clock mirror of [`Self::cycle_start`], display only
    pub fn cycle_start_display(&self) -> Option<&str> {
        self.cycle_start_display.as_deref()
    }

    /// Clamp-closing deadline, set only while clamps are closing
    pub fn phase_deadline(&self) -> Option<Instant> {
        self.phase_deadline
    }

    pub fn log(&self) -> &CycleLog {
        &self.log
    }

    pub fn anomalies(&self) -> Anomalies {
        self.anomalies
    }

    /// Discard the in-flight cycle; keep product, log, and counters
    pub fn clear_cycle(&mut self) {
        self.apply(CycleEvent::Reset);
        self.clear_timing();
    }

    /// Discard everything: cycle, product, log, and counters
    pub fn reset_all(&mut self) {
        self.clear_cycle();
        self.active_product = None;
        self.log.clear();
        self.anomalies = Anomalies::default();
    }

    /// Make `id` the active product
    ///
    /// A different product invalidates the log and any in-flight cycle.
    pub fn set_active_product(&mut self, id: &str) -> ProductChange {
        if self.active_product.as_deref() == Some(id) {
            return ProductChange::Unchanged;
        }

        let previous = self.active_product.replace(id.to_owned());
        let discarded_logs = self.log.clear();
        self.clear_cycle();
        self.anomalies = Anomalies::default();

        ProductChange::Switched {
            previous,
            discarded_logs,
        }
    }

    /// Clamp-window timeout handler
    ///
    /// Requires: cycle lock held by caller. This never acquires the lock
    /// itself; the `&mut self` receiver can only come from inside
    /// [`crate::SharedCycleState::with_lock`]. Product and log are left
    /// untouched and no entry is written.
    pub fn expire_clamp_window(&mut self) {
        self.apply(CycleEvent::ClampTimeout);
        self.clear_timing();
        self.anomalies.clamp_timeouts = self.anomalies.clamp_timeouts.saturating_add(1);
    }

    pub(crate) fn apply(&mut self, event: CycleEvent) {
        self.phase = self.phase.transition(event);
    }

    pub(crate) fn record_start(&mut self, at: Instant, display: String) {
        self.cycle_start = Some(at);
        self.cycle_start_display = Some(display);
    }

    /// Drop a latched start the engine cannot honour
    pub(crate) fn abandon_start(&mut self) {
        self.cycle_start = None;
        self.cycle_start_display = None;
        self.anomalies.abandoned_starts = self.anomalies.abandoned_starts.saturating_add(1);
    }

    pub(crate) fn set_deadline(&mut self, deadline: Instant) {
        self.phase_deadline = Some(deadline);
    }

    pub(crate) fn clear_deadline(&mut self) {
        self.phase_deadline = None;
    }

    pub(crate) fn append_log(&mut self, entry: CycleLogEntry) {
        self.log.push(entry);
    }

    pub(crate) fn note_rejected_start(&mut self) {
        self.anomalies.rejected_starts = self.anomalies.rejected_starts.saturating_add(1);
    }

    pub(crate) fn note_unlogged_release(&mut self) {
        self.anomalies.unlogged_releases = self.anomalies.unlogged_releases.saturating_add(1);
    }

    /// Finish the in-flight cycle after a release
    pub(crate) fn complete_cycle(&mut self) {
        self.apply(CycleEvent::ProductReleased);
        self.clear_timing();
    }

    fn clear_timing(&mut self) {
        self.cycle_start = None;
        self.cycle_start_display = None;
        self.phase_deadline = None;
    }
}
