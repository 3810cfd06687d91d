//! Rising-edge notification
//!
//! Adapters deliver edges on their own dispatch thread; debounce is applied
//! upstream, before a handler ever runs.

use thiserror::Error;

use crate::gpio::Line;

/// A debounced rising edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Line that went high
    pub line: Line,
}

/// Callback invoked for every accepted rising edge
///
/// Handlers run on the adapter's dispatch thread and must not block on it
/// for long: the next edge of any line waits until the handler returns.
pub type EdgeHandler = Box<dyn Fn(EdgeEvent) + Send + Sync + 'static>;

/// Edge registration errors
#[derive(Debug, Error)]
pub enum EdgeError {
    /// The adapter cannot watch this line
    #[error("line {0} cannot be watched for edges")]
    UnsupportedLine(Line),
    /// A handler is already registered for this line
    #[error("line {0} already has an edge handler")]
    AlreadyRegistered(Line),
    /// Underlying I/O failure while arming edge detection
    #[error("edge detection I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of debounced rising-edge notifications
pub trait EdgeNotifier {
    /// Call `handler` on every rising edge of `line`
    ///
    /// Edges arriving less than `debounce_ms` after the previously accepted
    /// edge on the same line are dropped.
    fn register_rising_edge(
        &self,
        line: Line,
        debounce_ms: u32,
        handler: EdgeHandler,
    ) -> Result<(), EdgeError>;

    /// Drop the handler registered for `line`, if any
    fn clear_rising_edge(&self, line: Line);
}
