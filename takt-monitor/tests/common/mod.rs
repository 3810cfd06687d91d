//! Shared fixtures for the monitor integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use takt_core::{Clock, CycleConfig, CyclePhase, ManualClock};
use takt_hal::Line;
use takt_hal_sim::SimulatedLines;
use takt_monitor::{CycleMonitor, Monitor};

pub const START: Line = 17;
pub const RESET: Line = 12;
pub const CLAMPS: [Line; 3] = [27, 5, 6];
pub const READY: [Line; 3] = [22, 16, 19];
pub const RELEASE: Line = 26;

pub struct Rig {
    pub lines: Arc<SimulatedLines>,
    pub clock: Arc<ManualClock>,
    pub monitor: Monitor,
}

impl Rig {
    pub fn start() -> Self {
        Self::start_with(fast_config())
    }

    pub fn start_with(config: CycleConfig) -> Self {
        let lines = Arc::new(SimulatedLines::new());
        let clock = Arc::new(ManualClock::new());
        let monitor = Monitor::start(config, lines.clone(), clock.clone()).unwrap();
        Self {
            lines,
            clock,
            monitor,
        }
    }

    pub fn cycle(&self) -> &CycleMonitor {
        self.monitor.cycle()
    }

    pub fn advance(&self, by: Duration) {
        self.clock
            .advance(embassy_time::Duration::from_micros(by.as_micros() as u64));
    }

    /// Press and release the start switch at the current clock time
    pub fn press_start(&self) {
        self.lines.pulse_at(START, self.clock.now());
    }

    pub fn press_reset(&self) {
        self.lines.pulse_at(RESET, self.clock.now());
    }

    pub fn set(&self, lines: &[Line], level: bool) {
        self.lines.set_levels(lines, level);
    }

    pub fn wait_for_phase(&self, phase: CyclePhase) {
        assert!(
            wait_until(|| self.cycle().phase() == phase),
            "phase never became {phase:?}, stuck in {:?}",
            self.cycle().phase()
        );
    }

    /// Let the engine run a few ticks
    pub fn settle(&self) {
        thread::sleep(Duration::from_millis(30));
    }

    /// Drive one complete cycle taking `seconds` on the manual clock
    pub fn run_cycle(&self, seconds: u64) {
        let before = self.cycle().stats().quantity;
        self.set(&READY, true);
        self.press_start();
        self.wait_for_phase(CyclePhase::ClampsClosing);

        self.advance(Duration::from_secs(seconds));
        self.set(&CLAMPS, true);
        self.wait_for_phase(CyclePhase::ProductRelease);

        self.set(&[RELEASE], true);
        assert!(wait_until(|| self.cycle().stats().quantity == before + 1));
        self.set(&CLAMPS, false);
        self.set(&[RELEASE], false);
    }
}

/// Default wiring with a short tick so tests run quickly
pub fn fast_config() -> CycleConfig {
    let mut config = CycleConfig::default();
    config.timing.tick_ms = 2;
    config.timing.stop_timeout_ms = 2_000;
    config
}

pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
