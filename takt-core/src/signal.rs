//! Monitored signal lines
//!
//! Every input the cycle logic looks at has a name here. Physical line
//! numbers are assigned separately through [`crate::config::LineMap`].

use core::fmt;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of monitored signals
pub const SIGNAL_COUNT: usize = 9;

/// A set of signals, e.g. the lines that failed an all-active check
pub type SignalSet = Vec<Signal, SIGNAL_COUNT>;

/// Named input signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Signal {
    /// Operator start switch (edge-triggered)
    StartSwitch,
    /// Clamp A closed sensor
    ClampA,
    /// Clamp B closed sensor
    ClampB,
    /// Clamp C closed sensor
    ClampC,
    /// Machine A ready sensor
    MachineReadyA,
    /// Machine B ready sensor
    MachineReadyB,
    /// Machine C ready sensor
    MachineReadyC,
    /// Finished product released sensor
    ProductRelease,
    /// Hardware reset button (edge-triggered)
    ResetButton,
}

impl Signal {
    /// All signals in a stable order
    pub const ALL: [Signal; SIGNAL_COUNT] = [
        Signal::StartSwitch,
        Signal::ClampA,
        Signal::ClampB,
        Signal::ClampC,
        Signal::MachineReadyA,
        Signal::MachineReadyB,
        Signal::MachineReadyC,
        Signal::ProductRelease,
        Signal::ResetButton,
    ];

    /// Clamp-closed sensors
    pub const CLAMPS: [Signal; 3] = [Signal::ClampA, Signal::ClampB, Signal::ClampC];

    /// Machine-ready sensors
    pub const MACHINE_READY: [Signal; 3] = [
        Signal::MachineReadyA,
        Signal::MachineReadyB,
        Signal::MachineReadyC,
    ];

    /// Position in [`Signal::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case key used in configuration and reports
    pub const fn key(self) -> &'static str {
        match self {
            Signal::StartSwitch => "start_switch",
            Signal::ClampA => "clamp_a",
            Signal::ClampB => "clamp_b",
            Signal::ClampC => "clamp_c",
            Signal::MachineReadyA => "machine_ready_a",
            Signal::MachineReadyB => "machine_ready_b",
            Signal::MachineReadyC => "machine_ready_c",
            Signal::ProductRelease => "product_release",
            Signal::ResetButton => "reset_button",
        }
    }

    /// Look a signal up by its key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Check if this is one of the clamp sensors
    pub fn is_clamp(self) -> bool {
        Self::CLAMPS.contains(&self)
    }

    /// Check if this is one of the machine-ready sensors
    pub fn is_machine_ready(self) -> bool {
        Self::MACHINE_READY.contains(&self)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
