//! GPIO input abstractions
//!
//! Provides traits for digital inputs that can be implemented by
//! platform-specific adapters.

/// Line number of a digital input (BCM numbering on a Raspberry Pi)
pub type Line = u8;

/// Digital input pin
///
/// Implementations should handle the actual hardware read for the
/// specific platform.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// A bank of digital inputs addressed by line number
///
/// `read_level` must be a non-blocking memory or register read: callers
/// sample lines while holding locks that other threads are waiting on.
pub trait DigitalInputs {
    /// Current raw level of `line` (true = logic 1)
    ///
    /// Lines the adapter does not know about read low.
    fn read_level(&self, line: Line) -> bool;

    /// Release the underlying hardware (unexport lines, stop samplers)
    ///
    /// Called once when the consumer shuts down or dies. Reads after
    /// release are allowed to return stale values.
    fn release(&self) {}
}

/// A single line of a [`DigitalInputs`] bank viewed as an [`InputPin`]
pub struct BankPin<'a, D: DigitalInputs + ?Sized> {
    bank: &'a D,
    line: Line,
}

impl<'a, D: DigitalInputs + ?Sized> BankPin<'a, D> {
    /// Borrow `line` of `bank` as a pin
    pub fn new(bank: &'a D, line: Line) -> Self {
        Self { bank, line }
    }

    /// Line number this pin reads
    pub fn line(&self) -> Line {
        self.line
    }
}

impl<D: DigitalInputs + ?Sized> InputPin for BankPin<'_, D> {
    fn is_high(&self) -> bool {
        self.bank.read_level(self.line)
    }
}
