//! Events that trigger phase transitions

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    // Input-driven events
    /// Engine picked up a latched start with an active product
    StartLatched,
    /// All clamp sensors active
    ClampsClosed,
    /// All machine-ready sensors active
    MachinesReady,
    /// Product release sensor active
    ProductReleased,

    // Watchdog events
    /// Clamp-closing deadline exceeded
    ClampTimeout,

    // Operator events
    /// Cycle discarded by reset button, full reset, or product change
    Reset,
}
