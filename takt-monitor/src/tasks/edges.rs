//! Rising-edge callbacks
//!
//! Invoked by the input adapter after its debounce window. They never
//! return errors to the adapter; refusals are logged.

use std::sync::Arc;

use tracing::{info, warn};

use takt_core::{Clock, SharedCycleState, StartDecision, StartGate};
use takt_hal::{EdgeEvent, EdgeHandler};

use crate::controller::{CycleMonitor, SharedInputs};

/// Start switch: latch a start if phase, interlock, and product allow it
pub fn start_switch_handler(
    state: Arc<SharedCycleState>,
    gate: StartGate,
    inputs: SharedInputs,
    clock: Arc<dyn Clock>,
) -> EdgeHandler {
    Box::new(move |event: EdgeEvent| {
        let now = clock.stamp();
        let decision = state.with_lock(|ctx| gate.evaluate(ctx, &*inputs, now));
        report(event, &decision);
    })
}

/// Reset button: abandon the current cycle, keep product and log
pub fn reset_button_handler(monitor: CycleMonitor) -> EdgeHandler {
    Box::new(move |event: EdgeEvent| {
        info!(line = event.line, "reset button pressed");
        monitor.reset_current_cycle();
    })
}

fn report(event: EdgeEvent, decision: &StartDecision) {
    match decision {
        StartDecision::Latched { product } => {
            info!(line = event.line, product = %product, "start latched")
        }
        StartDecision::WrongPhase(phase) => {
            warn!(phase = phase.name(), "start ignored: cycle already running")
        }
        StartDecision::AlreadyLatched => warn!("start ignored: previous start not yet picked up"),
        StartDecision::InterlockOpen { not_ready } => {
            warn!(?not_ready, "start rejected: interlock not satisfied")
        }
        StartDecision::NoProduct => warn!("start rejected: no active product"),
    }
}
