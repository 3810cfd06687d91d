//! Takt - production cycle monitor
//!
//! Opens the configured GPIO lines through sysfs, starts the cycle monitor,
//! and supervises the engine thread until Ctrl-C. Exits with status 1 if
//! the engine dies.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use takt_core::SystemClock;
use takt_hal::Line;
use takt_hal_sysfs::SysfsLines;
use takt_monitor::config::{load, ConfigSource};
use takt_monitor::{logging, EngineExit, Monitor};

/// How often the supervisor checks the engine thread
const SUPERVISE_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let source = ConfigSource::from_env();
    let config = load(&source).with_context(|| format!("loading {source}"))?;
    logging::init(&config.logging.filter)?;

    info!(version = env!("CARGO_PKG_VERSION"), "takt monitor starting");

    let lines: Vec<Line> = config.cycle.lines.lines().collect();
    let inputs = Arc::new(
        SysfsLines::open(&lines, config.cycle.timing.sample_ms).context("opening GPIO lines")?,
    );

    let mut monitor = Monitor::start(config.cycle, inputs, Arc::new(SystemClock))
        .context("starting cycle monitor")?;

    let engine_died = supervise(&monitor).await;

    let exit = monitor.stop().context("stopping cycle monitor")?;
    if engine_died || matches!(exit, EngineExit::Panicked(_)) {
        error!(?exit, "cycle engine died, fail-stopping");
        return Ok(ExitCode::FAILURE);
    }

    info!("takt monitor shut down");
    Ok(ExitCode::SUCCESS)
}

/// Wait for Ctrl-C or engine death; true if the engine died
async fn supervise(monitor: &Monitor) -> bool {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut listening = true;
    let mut check = tokio::time::interval(SUPERVISE_PERIOD);

    loop {
        tokio::select! {
            result = &mut shutdown, if listening => match result {
                Ok(()) => {
                    info!("shutdown requested");
                    return false;
                }
                Err(e) => {
                    error!(error = %e, "cannot listen for Ctrl-C, supervising only");
                    listening = false;
                }
            },
            _ = check.tick() => {
                if !monitor.is_engine_running() {
                    return true;
                }
            }
        }
    }
}
