//! Process-wide `tracing` subscriber setup.
//!
//! The engine only emits events; embedding applications that already install
//! their own subscriber should not call [`init`].

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Builds the filter: `RUST_LOG` when set and valid, `default_filter` otherwise.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a formatted stderr subscriber.
///
/// Returns false if a global subscriber was already installed, so repeated
/// calls are harmless.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// [`init`] with the filter from `config`.
pub fn init_from_config(config: &Config) -> bool {
    init(&config.log_filter)
}
