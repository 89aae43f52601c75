// crates/scopekeeper-config/src/config.rs
// ============================================================================
// Module: Scopekeeper Configuration
// Description: Configuration loading and validation for Scopekeeper.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: scopekeeper-core, scopekeeper-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[features]` table carries the global-resources switch, which becomes
//! the [`ScopePolicy`] handed to the store rather than process-wide state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use scopekeeper_core::InMemoryLockFactory;
use scopekeeper_core::ScopePolicy;
use scopekeeper_core::SharedLockFactory;
use scopekeeper_store_sqlite::SqliteResourceConfigStore;
use scopekeeper_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "scopekeeper.toml";
/// Environment variable naming the configuration file.
pub(crate) const CONFIG_ENV_VAR: &str = "SCOPEKEEPER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for the store busy timeout (ms).
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Default log level when `[logging]` is omitted.
const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Scopekeeper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopekeeperConfig {
    /// Resource config store configuration.
    pub store: SqliteStoreConfig,
    /// Feature switches.
    #[serde(default)]
    pub features: FeatureConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScopekeeperConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        self.logging.level_filter()?;
        Ok(())
    }

    /// Returns the scope policy selected by the feature switches.
    #[must_use]
    pub const fn scope_policy(&self) -> ScopePolicy {
        ScopePolicy::new(self.features.global_resources)
    }

    /// Opens the store with a process-local lock gate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the store cannot be opened.
    pub fn open_store(&self) -> Result<SqliteResourceConfigStore, ConfigError> {
        self.open_store_with_locks(SharedLockFactory::from_factory(InMemoryLockFactory::new()))
    }

    /// Opens the store with a caller-provided lock gate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the store cannot be opened.
    pub fn open_store_with_locks(
        &self,
        locks: SharedLockFactory,
    ) -> Result<SqliteResourceConfigStore, ConfigError> {
        let store = SqliteResourceConfigStore::new(&self.store, self.scope_policy(), locks)
            .map_err(|err| ConfigError::Store(err.to_string()))?;
        info!(
            path = %self.store.path.display(),
            global_resources = self.features.global_resources,
            "resource config store ready"
        );
        Ok(store)
    }
}

/// Feature switches.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeatureConfig {
    /// Share version history between resources with identical configs.
    #[serde(default)]
    pub global_resources: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown levels.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::Invalid(format!("unknown logging.level: {}", self.level)))
    }
}

/// Returns the default log level.
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The configured store could not be opened.
    #[error("config store error: {0}")]
    Store(String),
    /// The tracing subscriber could not be installed.
    #[error("config logging error: {0}")]
    Logging(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the `[store]` table.
fn validate_store(store: &SqliteStoreConfig) -> Result<(), ConfigError> {
    let path = store.path.to_string_lossy();
    if path.trim().is_empty() {
        return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
    }
    if path.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store.path exceeds max length".to_string()));
    }
    for component in store.path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store.path component too long".to_string()));
        }
    }
    if store.busy_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "store.busy_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if store.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
