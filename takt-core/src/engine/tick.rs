//! Per-tick engine step
//!
//! One call evaluates the current phase exactly once. Phases are advanced
//! on line levels, never on edges; only the start is edge-triggered and it
//! reaches the engine as a latched `cycle_start`.

use takt_hal::DigitalInputs;

use crate::clock::Stamp;
use crate::config::{CycleConfig, LineMap};
use crate::cycle::{CycleContext, CycleLogEntry};
use crate::safety::{ClampWatchdog, WatchdogStatus};
use crate::signal::{Signal, SignalSet};
use crate::state::{CycleEvent, CyclePhase};
use embassy_time::Instant;

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Waiting for start, nothing latched
    Idle,
    /// Latched start picked up; clamps now closing
    StartLatched { product: String, deadline: Instant },
    /// Latched start dropped because no product is active
    StartAbandoned,
    /// Clamp deadline passed; cycle discarded
    ClampTimeout,
    AwaitingClamps { open: SignalSet },
    ClampsClosed,
    AwaitingMachines { not_ready: SignalSet },
    MachinesReady,
    AwaitingRelease,
    /// Release seen and the cycle was appended to the log
    CycleLogged(CycleLogEntry),
    /// Release seen but start or product was missing; nothing logged
    ReleaseUnlogged {
        missing_start: bool,
        missing_product: bool,
    },
}

impl TickOutcome {
    /// The loop should run the next tick immediately instead of sleeping
    pub fn restarts_tick(&self) -> bool {
        matches!(self, TickOutcome::ClampTimeout)
    }
}

/// Phase driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEngine {
    lines: LineMap,
    watchdog: ClampWatchdog,
}

impl CycleEngine {
    pub fn new(lines: LineMap, watchdog: ClampWatchdog) -> Self {
        Self { lines, watchdog }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.lines.clone(), ClampWatchdog::from_config(&config.timing))
    }

    /// Advance the cycle by one step
    ///
    /// `now` must be read before the lock was taken.
    pub fn tick<I: DigitalInputs + ?Sized>(
        &self,
        ctx: &mut CycleContext,
        inputs: &I,
        now: Stamp,
    ) -> TickOutcome {
        match ctx.phase() {
            CyclePhase::WaitingForStart => self.pick_up_start(ctx, now.at),
            CyclePhase::ClampsClosing => self.check_clamps(ctx, inputs, now.at),
            CyclePhase::MachineReady => self.check_machines(ctx, inputs),
            CyclePhase::ProductRelease => self.check_release(ctx, inputs, now),
        }
    }

    fn pick_up_start(&self, ctx: &mut CycleContext, now: Instant) -> TickOutcome {
        if ctx.cycle_start().is_none() {
            return TickOutcome::Idle;
        }

        match ctx.active_product() {
            Some(product) => {
                let product = product.to_owned();
                let deadline = self.watchdog.arm(now);
                ctx.apply(CycleEvent::StartLatched);
                ctx.set_deadline(deadline);
                TickOutcome::StartLatched { product, deadline }
            }
            None => {
                ctx.abandon_start();
                TickOutcome::StartAbandoned
            }
        }
    }

    fn check_clamps<I: DigitalInputs + ?Sized>(
        &self,
        ctx: &mut CycleContext,
        inputs: &I,
        now: Instant,
    ) -> TickOutcome {
        if let WatchdogStatus::Expired { .. } = self.watchdog.status(ctx.phase_deadline(), now) {
            ctx.expire_clamp_window();
            return TickOutcome::ClampTimeout;
        }

        let open = self.lines.inactive(inputs, &Signal::CLAMPS);
        if open.is_empty() {
            ctx.clear_deadline();
            ctx.apply(CycleEvent::ClampsClosed);
            TickOutcome::ClampsClosed
        } else {
            TickOutcome::AwaitingClamps { open }
        }
    }

    fn check_machines<I: DigitalInputs + ?Sized>(
        &self,
        ctx: &mut CycleContext,
        inputs: &I,
    ) -> TickOutcome {
        let not_ready = self.lines.inactive(inputs, &Signal::MACHINE_READY);
        if not_ready.is_empty() {
            ctx.apply(CycleEvent::MachinesReady);
            TickOutcome::MachinesReady
        } else {
            TickOutcome::AwaitingMachines { not_ready }
        }
    }

    fn check_release<I: DigitalInputs + ?Sized>(
        &self,
        ctx: &mut CycleContext,
        inputs: &I,
        now: Stamp,
    ) -> TickOutcome {
        if !self.lines.is_active(inputs, Signal::ProductRelease) {
            return TickOutcome::AwaitingRelease;
        }

        let started = ctx
            .cycle_start()
            .zip(ctx.cycle_start_display().map(str::to_owned));
        let product = ctx.active_product().map(str::to_owned);

        let outcome = match (started, product) {
            (Some((start, start_display)), Some(product_id)) => {
                let entry = CycleLogEntry::new(
                    start_display,
                    now.display,
                    now.at.saturating_duration_since(start),
                    product_id,
                );
                ctx.append_log(entry.clone());
                TickOutcome::CycleLogged(entry)
            }
            (started, product) => {
                ctx.note_unlogged_release();
                TickOutcome::ReleaseUnlogged {
                    missing_start: started.is_none(),
                    missing_product: product.is_none(),
                }
            }
        };

        ctx.complete_cycle();
        outcome
    }
}

impl Default for CycleEngine {
    fn default() -> Self {
        Self::from_config(&CycleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::engine::start::{StartDecision, StartGate};
    use core::cell::Cell;
    use embassy_time::Duration;
    use proptest::prelude::*;
    use takt_hal::Line;

    #[derive(Default)]
    struct Levels(Cell<u32>);

    impl Levels {
        fn set(&self, lines: &[Line], level: bool) {
            let mut bits = self.0.get();
            for l in lines {
                if level {
                    bits |= 1 << l;
                } else {
                    bits &= !(1 << l);
                }
            }
            self.0.set(bits);
        }
    }

    impl DigitalInputs for Levels {
        fn read_level(&self, line: Line) -> bool {
            self.0.get() & (1 << line) != 0
        }
    }

    const CLAMPS: [Line; 3] = [27, 5, 6];
    const READY: [Line; 3] = [22, 16, 19];
    const RELEASE: Line = 26;

    fn latched(ctx: &mut CycleContext, levels: &Levels, clock: &ManualClock) {
        let gate = StartGate::default();
        let decision = gate.evaluate(ctx, levels, clock.stamp());
        assert!(matches!(decision, StartDecision::Latched { .. }), "{decision:?}");
    }

    #[test]
    fn test_concrete_cycle() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        levels.set(&READY, true);

        latched(&mut ctx, &levels, &clock);
        assert_eq!(ctx.phase(), CyclePhase::WaitingForStart);

        let out = engine.tick(&mut ctx, &levels, clock.stamp());
        assert_eq!(
            out,
            TickOutcome::StartLatched {
                product: "P1".into(),
                deadline: Instant::from_secs(60)
            }
        );
        assert_eq!(ctx.phase(), CyclePhase::ClampsClosing);

        clock.advance(Duration::from_secs(5));
        levels.set(&CLAMPS, true);
        assert_eq!(engine.tick(&mut ctx, &levels, clock.stamp()), TickOutcome::ClampsClosed);
        assert!(ctx.phase_deadline().is_none());
        assert_eq!(engine.tick(&mut ctx, &levels, clock.stamp()), TickOutcome::MachinesReady);
        assert_eq!(ctx.phase(), CyclePhase::ProductRelease);
        assert_eq!(engine.tick(&mut ctx, &levels, clock.stamp()), TickOutcome::AwaitingRelease);

        clock.advance(Duration::from_secs(2));
        levels.set(&[RELEASE], true);
        let TickOutcome::CycleLogged(entry) = engine.tick(&mut ctx, &levels, clock.stamp()) else {
            panic!("cycle was not logged");
        };
        assert_eq!(entry.duration_seconds, 7.0);
        assert_eq!(entry.product_id, "P1");
        assert_eq!(entry.start_display, "00:00:00.000");
        assert_eq!(entry.end_display, "00:00:07.000");

        assert_eq!(ctx.phase(), CyclePhase::WaitingForStart);
        assert!(ctx.cycle_start().is_none());
        assert_eq!(ctx.log().len(), 1);
    }

    #[test]
    fn test_duration_rounds_to_millis() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        levels.set(&READY, true);
        levels.set(&CLAMPS, true);

        latched(&mut ctx, &levels, &clock);
        engine.tick(&mut ctx, &levels, clock.stamp());
        engine.tick(&mut ctx, &levels, clock.stamp());
        engine.tick(&mut ctx, &levels, clock.stamp());
        clock.advance(Duration::from_micros(1_234_567));
        levels.set(&[RELEASE], true);

        let TickOutcome::CycleLogged(entry) = engine.tick(&mut ctx, &levels, clock.stamp()) else {
            panic!("cycle was not logged");
        };
        assert_eq!(entry.duration_seconds, 1.235);
    }

    #[test]
    fn test_clamp_timeout_discards_cycle() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        levels.set(&READY, true);

        latched(&mut ctx, &levels, &clock);
        engine.tick(&mut ctx, &levels, clock.stamp());

        // Exactly at the deadline is still in time
        clock.advance(Duration::from_secs(60));
        assert!(matches!(
            engine.tick(&mut ctx, &levels, clock.stamp()),
            TickOutcome::AwaitingClamps { .. }
        ));

        clock.advance(Duration::from_millis(50));
        let out = engine.tick(&mut ctx, &levels, clock.stamp());
        assert_eq!(out, TickOutcome::ClampTimeout);
        assert!(out.restarts_tick());

        assert_eq!(ctx.phase(), CyclePhase::WaitingForStart);
        assert!(ctx.cycle_start().is_none());
        assert!(ctx.phase_deadline().is_none());
        assert!(ctx.log().is_empty());
        assert_eq!(ctx.active_product(), Some("P1"));
        assert_eq!(ctx.anomalies().clamp_timeouts, 1);
    }

    #[test]
    fn test_timeout_wins_over_late_clamps() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        levels.set(&READY, true);

        latched(&mut ctx, &levels, &clock);
        engine.tick(&mut ctx, &levels, clock.stamp());
        clock.advance(Duration::from_secs(61));
        levels.set(&CLAMPS, true);

        assert_eq!(engine.tick(&mut ctx, &levels, clock.stamp()), TickOutcome::ClampTimeout);
    }

    #[test]
    fn test_awaiting_machines_names_lines() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        levels.set(&READY, true);
        levels.set(&CLAMPS, true);

        latched(&mut ctx, &levels, &clock);
        engine.tick(&mut ctx, &levels, clock.stamp());
        engine.tick(&mut ctx, &levels, clock.stamp());

        levels.set(&[16], false);
        let TickOutcome::AwaitingMachines { not_ready } =
            engine.tick(&mut ctx, &levels, clock.stamp())
        else {
            panic!("expected to wait for machines");
        };
        assert_eq!(not_ready.as_slice(), &[Signal::MachineReadyB]);
        assert_eq!(ctx.phase(), CyclePhase::MachineReady);
    }

    #[test]
    fn test_start_without_product_is_abandoned() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.record_start(clock.now(), clock.wall_display());

        assert_eq!(engine.tick(&mut ctx, &levels, clock.stamp()), TickOutcome::StartAbandoned);
        assert_eq!(ctx.phase(), CyclePhase::WaitingForStart);
        assert!(ctx.cycle_start().is_none());
        assert!(ctx.cycle_start_display().is_none());
        assert_eq!(ctx.anomalies().abandoned_starts, 1);
    }

    #[test]
    fn test_release_without_start_is_not_logged() {
        let engine = CycleEngine::default();
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        ctx.apply(CycleEvent::StartLatched);
        ctx.apply(CycleEvent::ClampsClosed);
        ctx.apply(CycleEvent::MachinesReady);
        levels.set(&[RELEASE], true);

        assert_eq!(
            engine.tick(&mut ctx, &levels, clock.stamp()),
            TickOutcome::ReleaseUnlogged {
                missing_start: true,
                missing_product: false
            }
        );
        assert_eq!(ctx.phase(), CyclePhase::WaitingForStart);
        assert!(ctx.log().is_empty());
        assert_eq!(ctx.anomalies().unlogged_releases, 1);
    }

    #[test]
    fn test_inverted_line_is_active_low() {
        let mut lines = LineMap::default();
        lines.set(Signal::ProductRelease, crate::config::PinConfig::inverted(RELEASE));
        let engine = CycleEngine::new(lines, ClampWatchdog::default());
        let clock = ManualClock::new();
        let levels = Levels::default();
        let mut ctx = CycleContext::new();
        ctx.set_active_product("P1");
        ctx.apply(CycleEvent::StartLatched);
        ctx.apply(CycleEvent::ClampsClosed);
        ctx.apply(CycleEvent::MachinesReady);

        // Line low reads active
        assert!(matches!(
            engine.tick(&mut ctx, &levels, clock.stamp()),
            TickOutcome::ReleaseUnlogged { .. }
        ));
    }

    #[test]
    fn test_only_timeout_restarts_tick() {
        assert!(TickOutcome::ClampTimeout.restarts_tick());
        assert!(!TickOutcome::ClampsClosed.restarts_tick());
        assert!(!TickOutcome::AwaitingRelease.restarts_tick());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Tick,
        StartEdge,
        Advance(u64),
        Lines(u32),
        SetProduct(bool),
        ResetCycle,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => Just(Step::Tick),
            2 => Just(Step::StartEdge),
            2 => (0u64..90_000).prop_map(Step::Advance),
            2 => any::<u32>().prop_map(Step::Lines),
            1 => any::<bool>().prop_map(Step::SetProduct),
            1 => Just(Step::ResetCycle),
        ]
    }

    proptest! {
        #[test]
        fn test_field_invariants_hold(steps in prop::collection::vec(step(), 1..200)) {
            let engine = CycleEngine::default();
            let gate = StartGate::default();
            let clock = ManualClock::new();
            let levels = Levels::default();
            let mut ctx = CycleContext::new();
            let mut logged = 0usize;

            for s in steps {
                match s {
                    Step::Tick => {
                        if let TickOutcome::CycleLogged(_) = engine.tick(&mut ctx, &levels, clock.stamp()) {
                            logged += 1;
                        }
                    }
                    Step::StartEdge => {
                        let before = ctx.clone();
                        let decision = gate.evaluate(&mut ctx, &levels, clock.stamp());
                        if !matches!(decision, StartDecision::Latched { .. }) {
                            prop_assert_eq!(ctx.phase(), before.phase());
                            prop_assert_eq!(ctx.cycle_start(), before.cycle_start());
                        }
                    }
                    Step::Advance(ms) => clock.advance(Duration::from_millis(ms)),
                    Step::Lines(bits) => levels.0.set(bits),
                    Step::SetProduct(p) => {
                        if let crate::cycle::ProductChange::Switched { .. } =
                            ctx.set_active_product(if p { "P1" } else { "P2" })
                        {
                            logged = 0;
                        }
                    }
                    Step::ResetCycle => ctx.clear_cycle(),
                }

                prop_assert_eq!(ctx.phase_deadline().is_some(), ctx.phase() == CyclePhase::ClampsClosing);
                if ctx.phase() != CyclePhase::WaitingForStart {
                    prop_assert!(ctx.cycle_start().is_some());
                }
                if ctx.cycle_start().is_some() {
                    prop_assert!(ctx.active_product().is_some());
                }
                prop_assert!(ctx.phase().code() <= 3);
                prop_assert_eq!(ctx.log().len(), logged);
            }
        }
    }
}
