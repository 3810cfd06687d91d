//! Line assignment types
//!
//! Maps each named [`Signal`] to a physical input line and its active level.

use core::fmt;

use heapless::FnvIndexMap;
use takt_hal::gpio::BankPin;
use takt_hal::{DigitalInputs, InputPin, Line};

use crate::signal::{Signal, SignalSet, SIGNAL_COUNT};

/// Number of user GPIO lines on the Raspberry Pi header (BCM 0-27)
pub const GPIO_COUNT: u8 = 28;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinConfig {
    /// GPIO line number (BCM numbering)
    pub pin: Line,
    /// Line is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create an active-high pin
    pub const fn new(pin: Line) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: Line) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }

    /// Whether a raw `level` means the signal is active
    pub const fn is_active(&self, level: bool) -> bool {
        level != self.inverted
    }
}

impl fmt::Display for PinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("!")?;
        }
        write!(f, "gpio{}", self.pin)
    }
}

/// Parse a pin string from config
///
/// Supports formats:
/// - "gpio17" -> active-high line 17
/// - "!gpio17" -> active-low line 17
pub fn parse_pin_string(s: &str) -> Option<PinConfig> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let pin: Line = s.strip_prefix("gpio")?.parse().ok()?;
    if pin >= GPIO_COUNT {
        return None;
    }

    Some(PinConfig { pin, inverted })
}

/// Line map validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMapError {
    /// Pin number outside the header range
    PinOutOfRange { signal: Signal, pin: Line },
    /// Two signals wired to the same line
    DuplicatePin {
        first: Signal,
        second: Signal,
        pin: Line,
    },
}

impl fmt::Display for LineMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineMapError::PinOutOfRange { signal, pin } => {
                write!(f, "{} uses gpio{} which is out of range", signal, pin)
            }
            LineMapError::DuplicatePin { first, second, pin } => {
                write!(f, "{} and {} are both wired to gpio{}", first, second, pin)
            }
        }
    }
}

/// Signal to line assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    pins: [PinConfig; SIGNAL_COUNT],
}

impl Default for LineMap {
    /// Wiring of the deployed line-side board (BCM numbering, active-high)
    fn default() -> Self {
        let mut map = Self {
            pins: [PinConfig::default(); SIGNAL_COUNT],
        };
        map.set(Signal::StartSwitch, PinConfig::new(17));
        map.set(Signal::ClampA, PinConfig::new(27));
        map.set(Signal::ClampB, PinConfig::new(5));
        map.set(Signal::ClampC, PinConfig::new(6));
        map.set(Signal::MachineReadyA, PinConfig::new(22));
        map.set(Signal::MachineReadyB, PinConfig::new(16));
        map.set(Signal::MachineReadyC, PinConfig::new(19));
        map.set(Signal::ProductRelease, PinConfig::new(26));
        map.set(Signal::ResetButton, PinConfig::new(12));
        map
    }
}

impl LineMap {
    /// Pin assigned to `signal`
    pub fn pin(&self, signal: Signal) -> PinConfig {
        self.pins[signal.index()]
    }

    /// Assign `signal` to `pin`
    pub fn set(&mut self, signal: Signal, pin: PinConfig) {
        self.pins[signal.index()] = pin;
    }

    /// Line number of every signal, in [`Signal::ALL`] order
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.pins.iter().map(|p| p.pin)
    }

    /// Check that every pin is in range and no line is shared
    pub fn validate(&self) -> Result<(), LineMapError> {
        let mut owners: FnvIndexMap<Line, Signal, 32> = FnvIndexMap::new();
        for signal in Signal::ALL {
            let pin = self.pin(signal).pin;
            if pin >= GPIO_COUNT {
                return Err(LineMapError::PinOutOfRange { signal, pin });
            }
            if let Some(&first) = owners.get(&pin) {
                return Err(LineMapError::DuplicatePin {
                    first,
                    second: signal,
                    pin,
                });
            }
            // Capacity (32) exceeds SIGNAL_COUNT
            let _ = owners.insert(pin, signal);
        }
        Ok(())
    }

    /// Raw level of the line behind `signal`
    pub fn level<I: DigitalInputs + ?Sized>(&self, inputs: &I, signal: Signal) -> bool {
        BankPin::new(inputs, self.pin(signal).pin).is_high()
    }

    /// Whether `signal` currently reads its active level
    pub fn is_active<I: DigitalInputs + ?Sized>(&self, inputs: &I, signal: Signal) -> bool {
        self.pin(signal).is_active(self.level(inputs, signal))
    }

    /// Signals among `signals` that are not active right now
    pub fn inactive<I: DigitalInputs + ?Sized>(&self, inputs: &I, signals: &[Signal]) -> SignalSet {
        let mut inactive = SignalSet::new();
        for &signal in signals {
            if !self.is_active(inputs, signal) {
                // At most SIGNAL_COUNT distinct signals exist
                let _ = inactive.push(signal);
            }
        }
        inactive
    }
}
