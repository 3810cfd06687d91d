//! Monitor lifecycle
//!
//! Wires the shared state, engine thread, and edge handlers together and
//! tears them down again.

use std::sync::Arc;

use tracing::{info, warn};

use takt_core::{Clock, CycleConfig, CycleEngine, SharedCycleState, Signal, StartGate};
use takt_hal::{DigitalInputs, EdgeHandler, EdgeNotifier};

use crate::controller::{CycleMonitor, SharedInputs};
use crate::error::MonitorError;
use crate::tasks::{reset_button_handler, spawn_engine, start_switch_handler};
use crate::tasks::{EngineExit, EngineHandle};

type SharedNotifier = Arc<dyn EdgeNotifier + Send + Sync>;

/// A running cycle monitor
///
/// The input bank holds the edge handlers, which hold the shared state.
/// [`Monitor::stop`] clears the registrations to break that loop.
pub struct Monitor {
    cycle: CycleMonitor,
    notifier: SharedNotifier,
    config: CycleConfig,
    engine: EngineHandle,
    stopped: bool,
}

impl Monitor {
    /// Validate `config`, spawn the engine, and register edge handlers
    pub fn start<I>(
        config: CycleConfig,
        inputs: Arc<I>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MonitorError>
    where
        I: DigitalInputs + EdgeNotifier + Send + Sync + 'static,
    {
        config.validate()?;

        let state = Arc::new(SharedCycleState::new());
        let bank: SharedInputs = inputs.clone();
        let notifier: SharedNotifier = inputs;
        let cycle = CycleMonitor::new(state.clone(), config.lines.clone(), bank.clone());

        let engine = spawn_engine(
            CycleEngine::from_config(&config),
            state.clone(),
            bank.clone(),
            clock.clone(),
            config.timing.tick_period(),
        )
        .map_err(MonitorError::Spawn)?;

        let mut monitor = Self {
            cycle,
            notifier,
            config,
            engine,
            stopped: false,
        };

        let start = start_switch_handler(state, StartGate::from_config(&monitor.config), bank, clock);
        let reset = reset_button_handler(monitor.cycle.clone());
        let registered = monitor
            .register(Signal::StartSwitch, start)
            .and_then(|()| monitor.register(Signal::ResetButton, reset));

        if let Err(e) = registered {
            if let Err(stop) = monitor.stop() {
                warn!(error = %stop, "engine did not stop after failed registration");
            }
            return Err(e);
        }

        info!(
            start = %monitor.config.lines.pin(Signal::StartSwitch),
            reset = %monitor.config.lines.pin(Signal::ResetButton),
            debounce_ms = monitor.config.timing.debounce_ms,
            "cycle monitor started"
        );
        Ok(monitor)
    }

    fn register(&self, signal: Signal, handler: EdgeHandler) -> Result<(), MonitorError> {
        let line = self.config.lines.pin(signal).pin;
        self.notifier
            .register_rising_edge(line, self.config.timing.debounce_ms, handler)
            .map_err(|source| MonitorError::EdgeRegistration { signal, source })
    }

    /// Façade handle for the HTTP layer
    pub fn cycle(&self) -> &CycleMonitor {
        &self.cycle
    }

    pub fn is_engine_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Clear edge handlers, stop the engine, and wait for it
    ///
    /// Waits at most `stop_timeout_ms`. Safe to call more than once.
    pub fn stop(&mut self) -> Result<EngineExit, MonitorError> {
        for signal in [Signal::StartSwitch, Signal::ResetButton] {
            self.notifier
                .clear_rising_edge(self.config.lines.pin(signal).pin);
        }

        let exit = self.engine.stop(self.config.timing.stop_timeout())?;
        self.stopped = true;
        info!(?exit, "cycle monitor stopped");
        Ok(exit)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if !self.stopped {
            if let Err(e) = self.stop() {
                warn!(error = %e, "cycle monitor dropped while running");
            }
        }
    }
}
