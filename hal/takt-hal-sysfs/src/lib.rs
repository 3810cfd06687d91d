//! Linux sysfs GPIO adapter
//!
//! Exposes Raspberry Pi header lines exported through `/sys/class/gpio` as a
//! [`DigitalInputs`] bank with rising-edge notification.
//!
//! A dedicated sampler thread polls every exported line, publishes the levels
//! into atomics, and runs edge handlers when a debounced low-to-high change is
//! seen. `read_level` therefore never touches the filesystem.

#![deny(unsafe_code)]

mod sampler;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use embassy_time::Duration;
use takt_hal::{DigitalInputs, EdgeError, EdgeHandler, EdgeNotifier, Line};
use thiserror::Error;
use tracing::{debug, info, warn};

use sampler::{Sampler, Watch};

/// Default sysfs GPIO root
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Number of user-accessible GPIO lines on the Raspberry Pi header
pub const GPIO_COUNT: usize = 28;

/// Sysfs adapter errors
#[derive(Debug, Error)]
pub enum SysfsError {
    /// Line number outside the header range
    #[error("gpio{0} is outside the header range (0-{max})", max = GPIO_COUNT - 1)]
    LineOutOfRange(Line),
    /// Exporting the line failed
    #[error("failed to export gpio{line}: {source}")]
    Export { line: Line, source: io::Error },
    /// Switching the line to input failed
    #[error("failed to configure gpio{line} as input: {source}")]
    Direction { line: Line, source: io::Error },
    /// The sampler thread could not be started
    #[error("failed to spawn gpio sampler: {0}")]
    Spawn(io::Error),
}

pub(crate) struct Shared {
    pub(crate) levels: [AtomicBool; GPIO_COUNT],
    pub(crate) watches: Mutex<Vec<Watch>>,
    pub(crate) stop: AtomicBool,
}

/// Input bank backed by sysfs GPIO
pub struct SysfsLines {
    root: PathBuf,
    lines: Vec<Line>,
    shared: Arc<Shared>,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl SysfsLines {
    /// Export `lines` under the default sysfs root and start sampling
    pub fn open(lines: &[Line], sample_period_ms: u32) -> Result<Self, SysfsError> {
        Self::open_at(SYSFS_GPIO_ROOT, lines, sample_period_ms)
    }

    /// Export `lines` under `root` and start sampling every `sample_period_ms`
    pub fn open_at(
        root: impl AsRef<Path>,
        lines: &[Line],
        sample_period_ms: u32,
    ) -> Result<Self, SysfsError> {
        let root = root.as_ref().to_path_buf();
        let shared = Arc::new(Shared {
            levels: core::array::from_fn(|_| AtomicBool::new(false)),
            watches: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
        });

        let mut exported = Vec::with_capacity(lines.len());
        for &line in lines {
            if line as usize >= GPIO_COUNT {
                return Err(SysfsError::LineOutOfRange(line));
            }
            if exported.contains(&line) {
                continue;
            }
            export_input(&root, line)?;
            let level = read_value(&root, line).unwrap_or(false);
            shared.levels[line as usize].store(level, Ordering::SeqCst);
            exported.push(line);
        }
        info!("sysfs: {} lines exported under {}", exported.len(), root.display());

        let sampler = Sampler::new(
            root.clone(),
            exported.clone(),
            shared.clone(),
            Duration::from_millis(sample_period_ms.max(1) as u64),
        );
        let handle = thread::Builder::new()
            .name("gpio-sampler".into())
            .spawn(move || sampler.run())
            .map_err(SysfsError::Spawn)?;

        Ok(Self {
            root,
            lines: exported,
            shared,
            sampler: Mutex::new(Some(handle)),
        })
    }

    /// Lines this adapter exported
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}

impl DigitalInputs for SysfsLines {
    fn read_level(&self, line: Line) -> bool {
        self.shared
            .levels
            .get(line as usize)
            .map(|level| level.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn release(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        let handle = self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("sysfs: sampler thread panicked");
            }
        }
        for &line in &self.lines {
            if let Err(e) = fs::write(self.root.join("unexport"), line.to_string()) {
                debug!("sysfs: unexport gpio{} failed: {}", line, e);
            }
        }
        info!("sysfs: released {} lines", self.lines.len());
    }
}

impl Drop for SysfsLines {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
    }
}

impl EdgeNotifier for SysfsLines {
    fn register_rising_edge(
        &self,
        line: Line,
        debounce_ms: u32,
        handler: EdgeHandler,
    ) -> Result<(), EdgeError> {
        if !self.lines.contains(&line) {
            return Err(EdgeError::UnsupportedLine(line));
        }
        let mut watches = self
            .shared
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if watches.iter().any(|w| w.line == line) {
            return Err(EdgeError::AlreadyRegistered(line));
        }
        watches.push(Watch::new(line, debounce_ms, handler));
        Ok(())
    }

    fn clear_rising_edge(&self, line: Line) {
        self.shared
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| w.line != line);
    }
}

fn line_dir(root: &Path, line: Line) -> PathBuf {
    root.join(format!("gpio{}", line))
}

fn export_input(root: &Path, line: Line) -> Result<(), SysfsError> {
    let dir = line_dir(root, line);
    if !dir.exists() {
        fs::write(root.join("export"), line.to_string())
            .map_err(|source| SysfsError::Export { line, source })?;
    }
    fs::write(dir.join("direction"), "in").map_err(|source| SysfsError::Direction { line, source })
}

pub(crate) fn read_value(root: &Path, line: Line) -> io::Result<bool> {
    let raw = fs::read_to_string(line_dir(root, line).join("value"))?;
    Ok(raw.trim() == "1")
}
