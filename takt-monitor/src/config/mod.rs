//! Configuration loading and parsing
//!
//! Loads `monitor.toml` from the command line, the environment, or the copy
//! embedded in the binary.

pub mod loader;
pub mod toml;

pub use loader::{load, ConfigSource, CONFIG_ENV, EMBEDDED_CONFIG};
pub use self::toml::{parse_config, LoggingConfig, MonitorConfig, DEFAULT_LOG_FILTER};
