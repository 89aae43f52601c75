//! Logging setup tests for scopekeeper-config.
// crates/scopekeeper-config/tests/logging.rs
// =============================================================================
// Module: Logging Setup Tests
// Description: Validate tracing subscriber installation.
// Purpose: Ensure bad levels fail before install and install happens once.
// =============================================================================

use scopekeeper_config::ConfigError;
use scopekeeper_config::LoggingConfig;
use scopekeeper_config::init_tracing;

type TestResult = Result<(), String>;

#[test]
fn init_tracing_rejects_unknown_level() -> TestResult {
    let config = LoggingConfig {
        level: "chatty".to_string(),
    };
    match init_tracing(&config) {
        Err(ConfigError::Invalid(message)) if message.contains("chatty") => Ok(()),
        Err(other) => Err(format!("unexpected error {other}")),
        Ok(()) => Err("expected unknown level to fail".to_string()),
    }
}

#[test]
fn init_tracing_installs_once() -> TestResult {
    let config = LoggingConfig::default();
    let _first = init_tracing(&config);
    match init_tracing(&config) {
        Err(ConfigError::Logging(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error {other}")),
        Ok(()) => Err("second install should fail".to_string()),
    }
}
