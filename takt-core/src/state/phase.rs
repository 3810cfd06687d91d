//! Cycle phase definition
//!
//! The current phase plus an event fully determine the next phase.

use super::events::CycleEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Production cycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CyclePhase {
    /// Idle until an accepted start edge is latched
    #[default]
    WaitingForStart,
    /// Start latched, waiting for all clamps to close (watchdog armed)
    ClampsClosing,
    /// Clamps closed, waiting for all machines to report ready
    MachineReady,
    /// Machines ready, waiting for the product release sensor
    ProductRelease,
}

impl CyclePhase {
    /// Numeric code reported to the tablet UI (0-3)
    pub const fn code(self) -> u8 {
        match self {
            CyclePhase::WaitingForStart => 0,
            CyclePhase::ClampsClosing => 1,
            CyclePhase::MachineReady => 2,
            CyclePhase::ProductRelease => 3,
        }
    }

    /// Stable snake_case name
    pub const fn name(self) -> &'static str {
        match self {
            CyclePhase::WaitingForStart => "waiting_for_start",
            CyclePhase::ClampsClosing => "clamps_closing",
            CyclePhase::MachineReady => "machine_ready",
            CyclePhase::ProductRelease => "product_release",
        }
    }

    /// Process an event and return the next phase
    ///
    /// This is the core transition table. Events that do not apply to the
    /// current phase leave it unchanged.
    pub fn transition(self, event: CycleEvent) -> Self {
        use CycleEvent::*;
        use CyclePhase::*;

        match (self, event) {
            (WaitingForStart, StartLatched) => ClampsClosing,

            (ClampsClosing, ClampsClosed) => MachineReady,
            // Only transition not driven by an input line
            (ClampsClosing, ClampTimeout) => WaitingForStart,

            (MachineReady, MachinesReady) => ProductRelease,

            (ProductRelease, ProductReleased) => WaitingForStart,

            // Operator or product change abandons any cycle
            (_, Reset) => WaitingForStart,

            // Default: stay in current phase
            _ => self,
        }
    }
}
