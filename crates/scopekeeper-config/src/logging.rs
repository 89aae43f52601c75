// crates/scopekeeper-config/src/logging.rs
// ============================================================================
// Module: Scopekeeper Logging
// Description: Tracing subscriber installation.
// Purpose: Route resolver events to stderr with an env-overridable filter.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG` wins when set; otherwise the configured `logging.level` is the
//! default directive. The subscriber is process-global and installs once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;
use crate::config::LoggingConfig;

// ============================================================================
// SECTION: Subscriber
// ============================================================================

/// Installs the global fmt subscriber.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for an unknown level and
/// [`ConfigError::Logging`] when a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let level = config.level_filter()?;
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ConfigError::Logging(err.to_string()))
}
