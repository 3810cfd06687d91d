//! Simulated input bank
//!
//! Implements [`DigitalInputs`] and [`EdgeNotifier`] over in-memory levels so
//! the monitor can be exercised without physical lines. Rising edges are
//! dispatched synchronously on the thread that changes the level, after the
//! same per-line debounce a hardware adapter applies.

#![deny(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use embassy_time::{Duration, Instant};
use takt_hal::{DigitalInputs, EdgeError, EdgeEvent, EdgeHandler, EdgeNotifier, Line};

/// Number of lines in the simulated bank
pub const SIM_LINE_COUNT: usize = 64;

type SharedHandler = Arc<dyn Fn(EdgeEvent) + Send + Sync + 'static>;

struct Watch {
    line: Line,
    debounce: Duration,
    last_accepted: Option<Instant>,
    handler: SharedHandler,
}

/// In-memory bank of digital lines
pub struct SimulatedLines {
    levels: [AtomicBool; SIM_LINE_COUNT],
    watches: Mutex<Vec<Watch>>,
    released: AtomicBool,
}

impl Default for SimulatedLines {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLines {
    /// Create a bank with every line low
    pub fn new() -> Self {
        Self {
            levels: core::array::from_fn(|_| AtomicBool::new(false)),
            watches: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    /// Drive `line` to `level` now
    pub fn set_level(&self, line: Line, level: bool) {
        self.set_level_at(line, level, Instant::now());
    }

    /// Drive `line` to `level`, stamping any resulting edge with `at`
    ///
    /// A low-to-high change on a watched line is debounced against the last
    /// accepted edge and, if accepted, its handler runs before this returns.
    pub fn set_level_at(&self, line: Line, level: bool, at: Instant) {
        let Some(slot) = self.levels.get(line as usize) else {
            return;
        };
        let previous = slot.swap(level, Ordering::SeqCst);
        if previous || !level {
            return;
        }

        let handler = {
            let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(watch) = watches.iter_mut().find(|w| w.line == line) else {
                return;
            };
            if let Some(last) = watch.last_accepted {
                if at.saturating_duration_since(last) < watch.debounce {
                    return;
                }
            }
            watch.last_accepted = Some(at);
            watch.handler.clone()
        };

        handler(EdgeEvent { line });
    }

    /// Drive several lines at once (no edge dispatch ordering guarantees)
    pub fn set_levels(&self, lines: &[Line], level: bool) {
        for &line in lines {
            self.set_level(line, level);
        }
    }

    /// Raise then lower `line`, as a momentary push button would
    pub fn pulse_at(&self, line: Line, at: Instant) {
        self.set_level_at(line, true, at);
        self.set_level_at(line, false, at);
    }

    /// Whether a handler is registered for `line`
    pub fn is_watched(&self, line: Line) -> bool {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|w| w.line == line)
    }

    /// Whether [`DigitalInputs::release`] has been called
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl DigitalInputs for SimulatedLines {
    fn read_level(&self, line: Line) -> bool {
        self.levels
            .get(line as usize)
            .map(|slot| slot.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl EdgeNotifier for SimulatedLines {
    fn register_rising_edge(
        &self,
        line: Line,
        debounce_ms: u32,
        handler: EdgeHandler,
    ) -> Result<(), EdgeError> {
        if line as usize >= SIM_LINE_COUNT {
            return Err(EdgeError::UnsupportedLine(line));
        }
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        if watches.iter().any(|w| w.line == line) {
            return Err(EdgeError::AlreadyRegistered(line));
        }
        watches.push(Watch {
            line,
            debounce: Duration::from_millis(debounce_ms as u64),
            last_accepted: None,
            handler: Arc::from(handler),
        });
        Ok(())
    }

    fn clear_rising_edge(&self, line: Line) {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| w.line != line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> EdgeHandler {
        let counter = counter.clone();
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_levels_round_trip() {
        let lines = SimulatedLines::new();
        assert!(!lines.read_level(17));
        lines.set_level(17, true);
        assert!(lines.read_level(17));
        lines.set_levels(&[5, 6], true);
        assert!(lines.read_level(5) && lines.read_level(6));
    }

    #[test]
    fn test_out_of_range_line_reads_low() {
        let lines = SimulatedLines::new();
        lines.set_level(200, true);
        assert!(!lines.read_level(200));
    }

    #[test]
    fn test_rising_edge_dispatch_and_debounce() {
        let lines = SimulatedLines::new();
        let hits = Arc::new(AtomicUsize::new(0));
        lines
            .register_rising_edge(17, 200, counting_handler(&hits))
            .unwrap();

        let t0 = Instant::from_secs(10);
        lines.pulse_at(17, t0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Bounce inside the window is swallowed
        lines.pulse_at(17, t0 + Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        lines.pulse_at(17, t0 + Duration::from_millis(250));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sustained_high_is_one_edge() {
        let lines = SimulatedLines::new();
        let hits = Arc::new(AtomicUsize::new(0));
        lines
            .register_rising_edge(12, 0, counting_handler(&hits))
            .unwrap();

        lines.set_level(12, true);
        lines.set_level(12, true);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_twice_rejected_and_clear() {
        let lines = SimulatedLines::new();
        let hits = Arc::new(AtomicUsize::new(0));
        lines
            .register_rising_edge(12, 0, counting_handler(&hits))
            .unwrap();
        assert!(matches!(
            lines.register_rising_edge(12, 0, counting_handler(&hits)),
            Err(EdgeError::AlreadyRegistered(12))
        ));

        lines.clear_rising_edge(12);
        assert!(!lines.is_watched(12));
        lines.set_level(12, true);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_release_flag() {
        let lines = SimulatedLines::new();
        assert!(!lines.is_released());
        lines.release();
        assert!(lines.is_released());
    }
}
