//! Tracing setup for the binary

use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

/// Install the global fmt subscriber
///
/// `RUST_LOG`, when set and valid, overrides `filter`.
pub fn init(filter: &str) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter).map_err(|source| LoggingError::Filter {
            filter: filter.to_owned(),
            source,
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}
