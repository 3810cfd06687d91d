//! Status snapshot returned to the HTTP layer

use serde::Serialize;

use takt_core::config::LineMap;
use takt_core::cycle::LogSummary;
use takt_core::{Anomalies, CycleContext, CyclePhase, Signal};
use takt_hal::{DigitalInputs, Line};

/// Phase as the tablet UI consumes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub name: &'static str,
    pub code: u8,
}

impl From<CyclePhase> for PhaseReport {
    fn from(phase: CyclePhase) -> Self {
        Self {
            name: phase.name(),
            code: phase.code(),
        }
    }
}

/// Live reading of one monitored line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineReading {
    pub signal: Signal,
    pub pin: Line,
    pub inverted: bool,
    /// Raw electrical level
    pub level: bool,
    /// Level after polarity
    pub active: bool,
}

/// Consistent view of the cycle state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStats {
    pub product_id: Option<String>,
    pub quantity: usize,
    pub first_start: Option<String>,
    pub last_end: Option<String>,
    pub average_cycle_seconds: f64,
    pub phase: PhaseReport,
    pub anomalies: Anomalies,
    pub lines: Vec<LineReading>,
}

impl CycleStats {
    /// Build from a locked context; reads every line through `inputs`
    pub(crate) fn capture<I: DigitalInputs + ?Sized>(
        ctx: &CycleContext,
        lines: &LineMap,
        inputs: &I,
    ) -> Self {
        let LogSummary {
            quantity,
            first_start,
            last_end,
            average_cycle_seconds,
        } = ctx.log().summary();

        let lines = Signal::ALL
            .iter()
            .map(|&signal| {
                let pin = lines.pin(signal);
                let level = lines.level(inputs, signal);
                LineReading {
                    signal,
                    pin: pin.pin,
                    inverted: pin.inverted,
                    level,
                    active: pin.is_active(level),
                }
            })
            .collect();

        Self {
            product_id: ctx.active_product().map(str::to_owned),
            quantity,
            first_start,
            last_end,
            average_cycle_seconds,
            phase: ctx.phase().into(),
            anomalies: ctx.anomalies(),
            lines,
        }
    }

    pub fn reading(&self, signal: Signal) -> Option<&LineReading> {
        self.lines.iter().find(|r| r.signal == signal)
    }
}
