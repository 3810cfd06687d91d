//! Error types for the monitor application

use std::io;
use std::path::PathBuf;

use takt_core::config::{ConfigIssue, LineMapError};
use takt_core::Signal;
use takt_hal::EdgeError;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown signal {0:?}")]
    UnknownSignal(String),

    #[error("invalid pin {value:?} for {signal} (expected \"gpioN\" or \"!gpioN\", N < 28)")]
    InvalidPin { signal: Signal, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(ConfigIssue),
}

/// Monitor lifecycle and façade errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("product id must not be empty")]
    EmptyProductId,

    #[error("line conflict: {0}")]
    PinConflict(LineMapError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(ConfigIssue),

    #[error("failed to register edge handler for {signal}: {source}")]
    EdgeRegistration {
        signal: Signal,
        #[source]
        source: EdgeError,
    },

    #[error("failed to spawn the cycle engine thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("cycle engine did not stop within {0:?}")]
    StopTimedOut(std::time::Duration),
}

impl From<ConfigIssue> for MonitorError {
    fn from(issue: ConfigIssue) -> Self {
        match issue {
            ConfigIssue::Lines(e) => MonitorError::PinConflict(e),
            other => MonitorError::InvalidConfig(other),
        }
    }
}

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}
