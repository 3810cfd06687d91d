//! Configuration source resolution
//!
//! First command-line argument, else `TAKT_CONFIG`, else the embedded
//! default.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::toml::{parse_config, MonitorConfig};
use crate::error::ConfigError;

/// Embedded default configuration (compiled into the binary)
/// Edit monitor.toml and rebuild to change it
pub const EMBEDDED_CONFIG: &str = include_str!("../../monitor.toml");

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TAKT_CONFIG";

/// Where the configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl ConfigSource {
    /// Pick the source from a CLI argument and the environment value
    pub fn resolve(arg: Option<OsString>, env: Option<OsString>) -> Self {
        arg.or(env)
            .filter(|p| !p.is_empty())
            .map(|p| ConfigSource::File(PathBuf::from(p)))
            .unwrap_or(ConfigSource::Embedded)
    }

    /// Resolve from this process's arguments and environment
    pub fn from_env() -> Self {
        Self::resolve(std::env::args_os().nth(1), std::env::var_os(CONFIG_ENV))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => f.write_str("embedded monitor.toml"),
        }
    }
}

/// Load and validate the configuration
pub fn load(source: &ConfigSource) -> Result<MonitorConfig, ConfigError> {
    let config = match source {
        ConfigSource::File(path) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            parse_config(&text)?
        }
        ConfigSource::Embedded => parse_config(EMBEDDED_CONFIG)?,
    };

    info!(source = %source, "configuration loaded");
    Ok(config)
}
