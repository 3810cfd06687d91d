//! Line sampler thread
//!
//! Polls every exported line, publishes levels, and dispatches debounced
//! rising edges. Runs until the adapter is released or dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use std::thread;

use embassy_time::{Duration, Instant};
use takt_hal::{EdgeEvent, EdgeHandler, Line};
use tracing::{debug, error, warn};

use crate::{read_value, Shared};

/// A registered rising-edge watch
pub(crate) struct Watch {
    pub(crate) line: Line,
    debounce: Duration,
    last_accepted: Option<Instant>,
    handler: Arc<dyn Fn(EdgeEvent) + Send + Sync + 'static>,
}

impl Watch {
    pub(crate) fn new(line: Line, debounce_ms: u32, handler: EdgeHandler) -> Self {
        Self {
            line,
            debounce: Duration::from_millis(debounce_ms as u64),
            last_accepted: None,
            handler: Arc::from(handler),
        }
    }

    /// Accept an edge at `at` unless it falls inside the debounce window
    fn accept(&mut self, at: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if at.saturating_duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_accepted = Some(at);
        true
    }
}

pub(crate) struct Sampler {
    root: PathBuf,
    lines: Vec<Line>,
    shared: Arc<Shared>,
    period: Duration,
}

impl Sampler {
    pub(crate) fn new(root: PathBuf, lines: Vec<Line>, shared: Arc<Shared>, period: Duration) -> Self {
        Self {
            root,
            lines,
            shared,
            period,
        }
    }

    pub(crate) fn run(self) {
        debug!("sysfs: sampler started ({} lines)", self.lines.len());
        let mut failing = vec![false; self.lines.len()];

        while !self.shared.stop.load(Ordering::SeqCst) {
            for (idx, &line) in self.lines.iter().enumerate() {
                let level = match read_value(&self.root, line) {
                    Ok(level) => {
                        failing[idx] = false;
                        level
                    }
                    Err(e) => {
                        if !failing[idx] {
                            warn!("sysfs: reading gpio{} failed: {}", line, e);
                            failing[idx] = true;
                        }
                        continue;
                    }
                };

                let previous = self.shared.levels[line as usize].swap(level, Ordering::SeqCst);
                if !previous && level {
                    self.dispatch_rising(line, Instant::now());
                }
            }
            thread::sleep(std::time::Duration::from_micros(self.period.as_micros()));
        }
        debug!("sysfs: sampler stopped");
    }

    fn dispatch_rising(&self, line: Line, at: Instant) {
        let handler = {
            let mut watches = self
                .shared
                .watches
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(watch) = watches.iter_mut().find(|w| w.line == line) else {
                return;
            };
            if !watch.accept(at) {
                return;
            }
            watch.handler.clone()
        };
        // Sampling continues after a handler panic
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(EdgeEvent { line })));
        if let Err(payload) = result {
            error!(
                "sysfs: edge handler for gpio{} panicked: {}",
                line,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    }
}
