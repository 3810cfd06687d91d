//! The cycle lock
//!
//! Engine, edge handlers, and the monitoring façade all reach the
//! [`CycleContext`] through [`SharedCycleState::with_lock`]. Each call is one
//! atomic critical section; nothing observes a half-applied update.

use std::sync::{Mutex, PoisonError};

use crate::cycle::CycleContext;

/// Cycle context behind its own mutual-exclusion region
///
/// The lock belongs to this value. Two states never contend with each other.
pub struct SharedCycleState {
    inner: Mutex<CycleContext>,
}

impl SharedCycleState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CycleContext::new()),
        }
    }

    /// Run `f` with exclusive access to the context
    ///
    /// Not reentrant: calling `with_lock` from inside `f` may deadlock. Keep `f`
    /// short and free of I/O and logging. A panic inside `f` does not wedge
    /// later callers; they see the context as `f` left it.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut CycleContext) -> R) -> R {
        let mut ctx = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ctx)
    }

    /// Consistent copy of the whole context
    pub fn snapshot(&self) -> CycleContext {
        self.with_lock(|ctx| ctx.clone())
    }
}

impl Default for SharedCycleState {
    fn default() -> Self {
        Self::new()
    }
}
