//! Start-edge decision
//!
//! Runs on every debounced rising edge of the start switch. Only records the
//! start; the engine's next tick moves the phase.

use takt_hal::DigitalInputs;

use crate::clock::Stamp;
use crate::config::{CycleConfig, LineMap};
use crate::cycle::CycleContext;
use crate::safety::{Interlock, InterlockStatus};
use crate::signal::SignalSet;
use crate::state::CyclePhase;

/// Result of one start edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
    /// Start recorded for `product`
    Latched { product: String },
    /// A cycle is already running
    WrongPhase(CyclePhase),
    /// An earlier edge is still waiting for the engine
    AlreadyLatched,
    /// Interlock lines not all active
    InterlockOpen { not_ready: SignalSet },
    /// No active product set
    NoProduct,
}

impl StartDecision {
    pub fn is_latched(&self) -> bool {
        matches!(self, StartDecision::Latched { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartGate {
    lines: LineMap,
    interlock: Interlock,
}

impl StartGate {
    pub fn new(lines: LineMap, interlock: Interlock) -> Self {
        Self { lines, interlock }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.lines.clone(), Interlock::from_config(&config.interlock))
    }

    /// Accept or refuse a start edge
    ///
    /// Checks run in order: phase, pending latch, interlock, product. A
    /// refused edge changes nothing but the rejection counter.
    pub fn evaluate<I: DigitalInputs + ?Sized>(
        &self,
        ctx: &mut CycleContext,
        inputs: &I,
        now: Stamp,
    ) -> StartDecision {
        let decision = self.decide(ctx, inputs);

        match decision {
            StartDecision::Latched { .. } => ctx.record_start(now.at, now.display),
            _ => ctx.note_rejected_start(),
        }
        decision
    }

    fn decide<I: DigitalInputs + ?Sized>(&self, ctx: &CycleContext, inputs: &I) -> StartDecision {
        let phase = ctx.phase();
        if phase != CyclePhase::WaitingForStart {
            return StartDecision::WrongPhase(phase);
        }
        if ctx.cycle_start().is_some() {
            return StartDecision::AlreadyLatched;
        }
        if let InterlockStatus::Open(not_ready) = self.interlock.check(&self.lines, inputs) {
            return StartDecision::InterlockOpen { not_ready };
        }
        match ctx.active_product() {
            Some(product) => StartDecision::Latched {
                product: product.to_owned(),
            },
            None => StartDecision::NoProduct,
        }
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::from_config(&CycleConfig::default())
    }
}
