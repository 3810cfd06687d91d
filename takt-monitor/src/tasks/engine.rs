//! Cycle engine thread
//!
//! Ticks the engine until told to stop. A panic inside a tick is caught at
//! the thread boundary, logged, and the input bank released so the
//! supervisor can fail-stop with hardware in a known state.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, error, info, trace, warn};

use takt_core::{Clock, CycleEngine, SharedCycleState, TickOutcome};

use crate::controller::SharedInputs;
use crate::error::MonitorError;

pub const ENGINE_THREAD_NAME: &str = "cycle-engine";

/// How the engine thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineExit {
    Stopped,
    Panicked(String),
}

/// Everything the loop needs, moved onto the thread
struct EngineLoop {
    engine: CycleEngine,
    state: Arc<SharedCycleState>,
    inputs: SharedInputs,
    clock: Arc<dyn Clock>,
    tick: Duration,
    stop: Receiver<()>,
}

impl EngineLoop {
    fn run(&self) {
        info!(tick_ms = self.tick.as_millis() as u64, "cycle engine running");
        loop {
            let now = self.clock.stamp();
            let outcome = self
                .state
                .with_lock(|ctx| self.engine.tick(ctx, &*self.inputs, now));
            report(&outcome);

            if outcome.restarts_tick() {
                match self.stop.try_recv() {
                    Err(TryRecvError::Empty) => continue,
                    _ => break,
                }
            }

            match self.stop.recv_timeout(self.tick) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

/// Log what a tick did, outside the lock
fn report(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Idle | TickOutcome::AwaitingRelease => {}
        TickOutcome::AwaitingClamps { open } => trace!(?open, "waiting for clamps"),
        TickOutcome::StartLatched { product, deadline } => info!(
            product = %product,
            deadline_ms = deadline.as_millis(),
            "start accepted, clamps closing"
        ),
        TickOutcome::StartAbandoned => warn!("start dropped: no active product"),
        TickOutcome::ClampTimeout => warn!("clamps did not close in time, cycle discarded"),
        TickOutcome::ClampsClosed => info!("clamps closed"),
        TickOutcome::AwaitingMachines { not_ready } => {
            debug!(?not_ready, "waiting for machines")
        }
        TickOutcome::MachinesReady => info!("machines ready, waiting for release"),
        TickOutcome::CycleLogged(entry) => info!(
            product = %entry.product_id,
            start = %entry.start_display,
            end = %entry.end_display,
            seconds = entry.duration_seconds,
            "cycle logged"
        ),
        TickOutcome::ReleaseUnlogged {
            missing_start,
            missing_product,
        } => warn!(
            missing_start,
            missing_product, "release seen without a recorded cycle, not logged"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Handle onto the engine thread
pub struct EngineHandle {
    stop: Sender<()>,
    done: Receiver<EngineExit>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the loop and wait up to `timeout` for it to end
    pub fn stop(&mut self, timeout: Duration) -> Result<EngineExit, MonitorError> {
        // Full means a stop is already pending
        let _ = self.stop.try_send(());

        let exit = match self.done.recv_timeout(timeout) {
            Ok(exit) => exit,
            Err(RecvTimeoutError::Disconnected) => EngineExit::Stopped,
            Err(RecvTimeoutError::Timeout) => return Err(MonitorError::StopTimedOut(timeout)),
        };

        if let Some(thread) = self.thread.take() {
            // Body is wrapped in catch_unwind; join cannot carry a panic
            let _ = thread.join();
        }
        Ok(exit)
    }
}

/// Start the engine loop on its own thread
pub fn spawn_engine(
    engine: CycleEngine,
    state: Arc<SharedCycleState>,
    inputs: SharedInputs,
    clock: Arc<dyn Clock>,
    tick: Duration,
) -> io::Result<EngineHandle> {
    let (stop_tx, stop_rx) = bounded(1);
    let (done_tx, done_rx) = bounded(1);

    let engine_loop = EngineLoop {
        engine,
        state,
        inputs,
        clock,
        tick,
        stop: stop_rx,
    };

    let thread = thread::Builder::new()
        .name(ENGINE_THREAD_NAME.to_owned())
        .spawn(move || {
            let exit = match panic::catch_unwind(AssertUnwindSafe(|| engine_loop.run())) {
                Ok(()) => {
                    info!("cycle engine stopped");
                    EngineExit::Stopped
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(panic = %message, "cycle engine crashed, releasing inputs");
                    EngineExit::Panicked(message)
                }
            };
            engine_loop.inputs.release();
            let _ = done_tx.send(exit);
        })?;

    Ok(EngineHandle {
        stop: stop_tx,
        done: done_rx,
        thread: Some(thread),
    })
}
