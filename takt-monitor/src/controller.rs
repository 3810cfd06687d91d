//! Reporting façade
//!
//! The handle the HTTP layer and the reset button use. Every method is one
//! acquisition of the cycle lock; logging happens after it is released.

use std::sync::Arc;

use tracing::{info, warn};

use takt_core::config::LineMap;
use takt_core::{CycleLogEntry, CyclePhase, ProductChange, SharedCycleState};
use takt_hal::DigitalInputs;

use crate::error::MonitorError;
use crate::stats::CycleStats;

/// Shared input bank as the façade and engine see it
pub type SharedInputs = Arc<dyn DigitalInputs + Send + Sync>;

/// Cheap-to-clone handle onto the running monitor
#[derive(Clone)]
pub struct CycleMonitor {
    state: Arc<SharedCycleState>,
    lines: LineMap,
    inputs: SharedInputs,
}

impl CycleMonitor {
    pub fn new(state: Arc<SharedCycleState>, lines: LineMap, inputs: SharedInputs) -> Self {
        Self {
            state,
            lines,
            inputs,
        }
    }

    pub fn state(&self) -> &Arc<SharedCycleState> {
        &self.state
    }

    /// Switch the active product
    ///
    /// A different id discards the log and any in-flight cycle. The same id
    /// again changes nothing. Ids are compared as given; only an empty or
    /// whitespace-only id is refused.
    pub fn set_active_product(&self, id: &str) -> Result<ProductChange, MonitorError> {
        if id.trim().is_empty() {
            return Err(MonitorError::EmptyProductId);
        }

        let change = self.state.with_lock(|ctx| ctx.set_active_product(id));

        if let ProductChange::Switched {
            previous,
            discarded_logs,
        } = &change
        {
            info!(product = id, ?previous, discarded_logs, "active product changed");
        }
        Ok(change)
    }

    /// Snapshot of log summary, phase, counters, and live line levels
    pub fn stats(&self) -> CycleStats {
        self.state
            .with_lock(|ctx| CycleStats::capture(ctx, &self.lines, &*self.inputs))
    }

    /// Owned copy of every logged cycle
    pub fn logs(&self) -> Vec<CycleLogEntry> {
        self.state.with_lock(|ctx| ctx.log().entries().to_vec())
    }

    pub fn phase(&self) -> CyclePhase {
        self.state.with_lock(|ctx| ctx.phase())
    }

    pub fn active_product(&self) -> Option<String> {
        self.state
            .with_lock(|ctx| ctx.active_product().map(str::to_owned))
    }

    /// Clear cycle, product, log, and counters
    pub fn reset_all(&self) {
        let discarded = self.state.with_lock(|ctx| {
            let discarded = ctx.log().len();
            ctx.reset_all();
            discarded
        });
        warn!(discarded_logs = discarded, "full reset");
    }

    /// Abandon the in-flight cycle only; product and log stay
    pub fn reset_current_cycle(&self) {
        let abandoned = self.state.with_lock(|ctx| {
            let phase = ctx.phase();
            let latched = ctx.cycle_start().is_some();
            ctx.clear_cycle();
            (phase, latched)
        });

        match abandoned {
            (CyclePhase::WaitingForStart, false) => info!("cycle reset (idle)"),
            (phase, _) => warn!(phase = phase.name(), "current cycle reset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use takt_core::Signal;
    use takt_hal::Line;

    struct Levels(u32);

    impl DigitalInputs for Levels {
        fn read_level(&self, line: Line) -> bool {
            self.0 & (1 << line) != 0
        }
    }

    fn monitor(levels: u32) -> CycleMonitor {
        CycleMonitor::new(
            Arc::new(SharedCycleState::new()),
            LineMap::default(),
            Arc::new(Levels(levels)),
        )
    }

    #[test]
    fn test_blank_product_rejected() {
        let m = monitor(0);
        assert!(matches!(m.set_active_product("  "), Err(MonitorError::EmptyProductId)));
        assert!(m.active_product().is_none());
    }

    #[test]
    fn test_product_id_compared_as_given() {
        let m = monitor(0);
        m.set_active_product(" P1 ").unwrap();
        assert_eq!(m.active_product().as_deref(), Some(" P1 "));
        assert_eq!(m.set_active_product(" P1 ").unwrap(), ProductChange::Unchanged);
        assert!(matches!(
            m.set_active_product("P1").unwrap(),
            ProductChange::Switched { .. }
        ));
        assert_eq!(m.active_product().as_deref(), Some("P1"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = monitor(0).stats();
        assert_eq!(stats.quantity, 0);
        assert_eq!(stats.first_start, None);
        assert_eq!(stats.last_end, None);
        assert_eq!(stats.average_cycle_seconds, 0.0);
        assert_eq!(stats.phase.code, 0);
        assert_eq!(stats.lines.len(), 9);
    }

    #[test]
    fn test_stats_read_lines_live() {
        let m = monitor(1 << 17);
        let stats = m.stats();

        let start = stats.reading(Signal::StartSwitch).unwrap();
        assert_eq!(start.pin, 17);
        assert!(start.level);
        assert!(start.active);
        assert!(!stats.reading(Signal::ClampA).unwrap().active);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(monitor(0).stats()).unwrap();
        assert_eq!(json["phase"]["name"], "waiting_for_start");
        assert_eq!(json["phase"]["code"], 0);
        assert_eq!(json["lines"][0]["signal"], "start_switch");
        assert!(json["product_id"].is_null());
    }
}
