//! Structured logging configuration.
//!
//! Builds a `tracing-subscriber` from the configured filter directive; the
//! `RUST_LOG` environment variable takes precedence when set.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let _ = fmt().with_env_filter(filter).try_init();
}
