//! TOML schema for monitor.toml
//!
//! Deserialized with serde into raw tables, then checked and converted into
//! the core configuration types. Missing sections and keys take defaults.

use std::collections::BTreeMap;

use serde::Deserialize;

use takt_core::config::{
    parse_pin_string, CycleConfig, InterlockConfig, LineMap, TimingConfig, DEFAULT_CLAMP_TIMEOUT_S,
    DEFAULT_DEBOUNCE_MS, DEFAULT_SAMPLE_MS, DEFAULT_STOP_TIMEOUT_MS, DEFAULT_TICK_MS,
};
use takt_core::{Signal, SignalSet};

use crate::error::ConfigError;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

/// Everything the binary needs to start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorConfig {
    pub cycle: CycleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    lines: BTreeMap<String, String>,
    timing: RawTiming,
    interlock: RawInterlock,
    logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawTiming {
    tick_ms: u32,
    clamp_timeout_s: u32,
    debounce_ms: u32,
    stop_timeout_ms: u32,
    sample_ms: u32,
}

impl Default for RawTiming {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            clamp_timeout_s: DEFAULT_CLAMP_TIMEOUT_S,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            sample_ms: DEFAULT_SAMPLE_MS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawInterlock {
    start_requires: Option<Vec<String>>,
}

/// Parse and validate a monitor.toml document
pub fn parse_config(text: &str) -> Result<MonitorConfig, ConfigError> {
    let raw: RawConfig = ::toml::from_str(text)?;

    let cycle = CycleConfig {
        lines: parse_lines(&raw.lines)?,
        timing: TimingConfig {
            tick_ms: raw.timing.tick_ms,
            clamp_timeout_s: raw.timing.clamp_timeout_s,
            debounce_ms: raw.timing.debounce_ms,
            stop_timeout_ms: raw.timing.stop_timeout_ms,
            sample_ms: raw.timing.sample_ms,
        },
        interlock: parse_interlock(raw.interlock)?,
    };
    cycle.validate().map_err(ConfigError::Invalid)?;

    Ok(MonitorConfig {
        cycle,
        logging: raw.logging,
    })
}

fn signal_from_key(key: &str) -> Result<Signal, ConfigError> {
    Signal::from_key(key).ok_or_else(|| ConfigError::UnknownSignal(key.to_owned()))
}

/// Unlisted signals keep their default wiring
fn parse_lines(table: &BTreeMap<String, String>) -> Result<LineMap, ConfigError> {
    let mut lines = LineMap::default();
    for (key, value) in table {
        let signal = signal_from_key(key)?;
        let pin = parse_pin_string(value).ok_or_else(|| ConfigError::InvalidPin {
            signal,
            value: value.clone(),
        })?;
        lines.set(signal, pin);
    }
    Ok(lines)
}

fn parse_interlock(raw: RawInterlock) -> Result<InterlockConfig, ConfigError> {
    let Some(keys) = raw.start_requires else {
        return Ok(InterlockConfig::default());
    };

    let mut start_requires = SignalSet::new();
    for key in &keys {
        let signal = signal_from_key(key)?;
        if !start_requires.contains(&signal) {
            // Distinct signals never exceed the set's capacity
            let _ = start_requires.push(signal);
        }
    }
    Ok(InterlockConfig { start_requires })
}

#[cfg(test)]
mod tests {
    use super::*;
    use takt_core::config::{ConfigIssue, LineMapError, PinConfig};

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(crate::config::EMBEDDED_CONFIG).unwrap();
        assert_eq!(config.cycle, CycleConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [lines]
            product_release = "!gpio4"

            [timing]
            clamp_timeout_s = 90

            [logging]
            filter = "takt_monitor=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.cycle.lines.pin(Signal::ProductRelease), PinConfig::inverted(4));
        assert_eq!(config.cycle.lines.pin(Signal::StartSwitch), PinConfig::new(17));
        assert_eq!(config.cycle.timing.clamp_timeout_s, 90);
        assert_eq!(config.cycle.timing.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.logging.filter, "takt_monitor=debug");
    }

    #[test]
    fn test_two_line_interlock() {
        let config = parse_config(
            r#"
            [interlock]
            start_requires = ["machine_ready_a", "machine_ready_c", "machine_ready_a"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.cycle.interlock.start_requires.as_slice(),
            &[Signal::MachineReadyA, Signal::MachineReadyC]
        );
    }

    #[test]
    fn test_rejects_unknown_signal() {
        let err = parse_config("[lines]\nconveyor = \"gpio3\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSignal(key) if key == "conveyor"));
    }

    #[test]
    fn test_rejects_bad_pin() {
        let err = parse_config("[lines]\nclamp_a = \"gpio40\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPin { signal: Signal::ClampA, .. }
        ));
    }

    #[test]
    fn test_rejects_duplicate_pin() {
        let err = parse_config("[lines]\nclamp_a = \"gpio5\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigIssue::Lines(LineMapError::DuplicatePin { pin: 5, .. }))
        ));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let err = parse_config("[timing]\ntick_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ConfigIssue::ZeroTick)));
    }

    #[test]
    fn test_rejects_release_in_interlock() {
        let err = parse_config("[interlock]\nstart_requires = [\"product_release\"]\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigIssue::InterlockSignal(Signal::ProductRelease))
        ));
    }

    #[test]
    fn test_rejects_empty_interlock() {
        let err = parse_config("[interlock]\nstart_requires = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ConfigIssue::EmptyInterlock)));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = parse_config("[timing]\ntick = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
