//! Start interlock
//!
//! A start is only accepted while every required line reads active.

use takt_hal::DigitalInputs;

use crate::config::{InterlockConfig, LineMap};
use crate::signal::SignalSet;

/// Outcome of checking the interlock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterlockStatus {
    Satisfied,
    /// Required signals that are not active
    Open(SignalSet),
}

/// Required-signal set checked on every start edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interlock {
    required: SignalSet,
}

impl Interlock {
    pub fn new(required: SignalSet) -> Self {
        Self { required }
    }

    pub fn from_config(config: &InterlockConfig) -> Self {
        Self::new(config.start_requires.clone())
    }

    /// Read the required lines now
    pub fn check<I: DigitalInputs + ?Sized>(&self, lines: &LineMap, inputs: &I) -> InterlockStatus {
        let open = lines.inactive(inputs, &self.required);
        if open.is_empty() {
            InterlockStatus::Satisfied
        } else {
            InterlockStatus::Open(open)
        }
    }
}

impl Default for Interlock {
    fn default() -> Self {
        Self::from_config(&InterlockConfig::default())
    }
}
