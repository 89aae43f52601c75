// crates/scopekeeper-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Resource Config Store
// Description: Durable ResourceConfigResolver backed by SQLite.
// Purpose: Own connections, transactions, and the public resolution surface.
// Dependencies: scopekeeper-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteResourceConfigStore`] runs every resolution inside one
//! `BEGIN IMMEDIATE` transaction, so the database write lock is held from the
//! existence check through the upsert and any failure rolls back every
//! intermediate write. Each store handle owns one connection; concurrent
//! callers open their own handles on the same database file and contend on
//! the `SQLite` busy timeout. No resolved identity is cached between calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use scopekeeper_core::BaseResourceType;
use scopekeeper_core::BaseResourceTypeId;
use scopekeeper_core::Lock;
use scopekeeper_core::LockFactory;
use scopekeeper_core::LockId;
use scopekeeper_core::ResourceCache;
use scopekeeper_core::ResourceCacheDescriptor;
use scopekeeper_core::ResourceConfig;
use scopekeeper_core::ResourceConfigDescriptor;
use scopekeeper_core::ResourceConfigError;
use scopekeeper_core::ResourceConfigId;
use scopekeeper_core::ResourceConfigResolver;
use scopekeeper_core::ResourceConfigScope;
use scopekeeper_core::ResourceId;
use scopekeeper_core::ScopePolicy;
use scopekeeper_core::SharedLockFactory;
use scopekeeper_core::StoreError;
use scopekeeper_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::origin;
use crate::resource_config;
use crate::schema::initialize_schema;
use crate::scope;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` resource config store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` bounds how long a resolver waits for the write lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<SqliteStoreError> for ResourceConfigError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Store(StoreError::from(error))
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed resource config and scope resolver.
#[derive(Clone)]
pub struct SqliteResourceConfigStore {
    /// Connection guarded by a mutex; one transaction at a time per handle.
    connection: Arc<Mutex<Connection>>,
    /// Scope privacy policy applied by scope resolution.
    policy: ScopePolicy,
    /// Lock gate for per-scope serialization.
    locks: SharedLockFactory,
}

impl SqliteResourceConfigStore {
    /// Opens an `SQLite`-backed store, creating the schema when absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// carries an unsupported schema version.
    pub fn new(
        config: &SqliteStoreConfig,
        policy: ScopePolicy,
        locks: SharedLockFactory,
    ) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        debug!(
            path = %config.path.display(),
            global_resources = policy.global_resources,
            "opened resource config store"
        );
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            policy,
            locks,
        })
    }

    /// Returns the scope policy this store applies.
    #[must_use]
    pub const fn policy(&self) -> ScopePolicy {
        self.policy
    }

    /// Registers or updates a worker-provided base resource type.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::Store`] when the write fails.
    pub fn register_base_resource_type(
        &self,
        name: &str,
        unique_version_history: bool,
    ) -> Result<BaseResourceType, ResourceConfigError> {
        self.with_transaction(|tx| {
            let raw: i64 = tx
                .query_row(
                    "INSERT INTO base_resource_types (name, unique_version_history) VALUES (?1, \
                     ?2) ON CONFLICT (name) DO UPDATE SET unique_version_history = \
                     excluded.unique_version_history RETURNING id",
                    params![name, unique_version_history],
                    |row| row.get(0),
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(BaseResourceType {
                id: decode_id(raw, BaseResourceTypeId::from_raw)?,
                name: name.to_string(),
                unique_version_history,
            })
        })
    }

    /// Attempts to take the checking lock of `scope` without blocking.
    ///
    /// Returns `None` when another holder of the same lock gate is checking.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::Lock`] when the lock backend fails.
    pub fn acquire_checking_lock(
        &self,
        scope: &ResourceConfigScope,
    ) -> Result<Option<Box<dyn Lock>>, ResourceConfigError> {
        let lock = self.locks.acquire(LockId::ResourceScopeChecking(scope.id()))?;
        if lock.is_none() {
            debug!(resource_config_scope_id = %scope.id(), "checking lock already held");
        }
        Ok(lock)
    }

    /// Runs `operation` inside an immediate transaction, committing on success.
    fn with_transaction<T>(
        &self,
        operation: impl FnOnce(&Transaction<'_>) -> Result<T, ResourceConfigError>,
    ) -> Result<T, ResourceConfigError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let value = operation(&tx)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(value)
    }
}

impl ResourceConfigResolver for SqliteResourceConfigStore {
    fn find_or_create_resource_config(
        &self,
        descriptor: &ResourceConfigDescriptor,
    ) -> Result<ResourceConfig, ResourceConfigError> {
        self.with_transaction(|tx| resource_config::find_or_create(tx, descriptor))
    }

    fn find_or_create_scope(
        &self,
        config: &ResourceConfig,
        resource: Option<ResourceId>,
    ) -> Result<ResourceConfigScope, ResourceConfigError> {
        self.with_transaction(|tx| {
            if !resource_config::exists(tx, config.id())? {
                warn!(resource_config_id = %config.id(), "resource config disappeared before scope resolution");
                return Err(ResourceConfigError::Disappeared);
            }
            scope::find_or_create(tx, self.policy, config, resource)
        })
    }

    fn resolve_scope(
        &self,
        descriptor: &ResourceConfigDescriptor,
        resource: Option<ResourceId>,
    ) -> Result<ResourceConfigScope, ResourceConfigError> {
        self.with_transaction(|tx| {
            let config = resource_config::find_or_create(tx, descriptor)?;
            scope::find_or_create(tx, self.policy, &config, resource)
        })
    }

    fn update_last_referenced(
        &self,
        config_id: ResourceConfigId,
    ) -> Result<Timestamp, ResourceConfigError> {
        self.with_transaction(|tx| {
            resource_config::update_last_referenced(tx, config_id)?.ok_or_else(|| {
                warn!(resource_config_id = %config_id, "resource config disappeared before refresh");
                ResourceConfigError::Disappeared
            })
        })
    }

    fn find_resource_config(
        &self,
        config_id: ResourceConfigId,
    ) -> Result<Option<ResourceConfig>, ResourceConfigError> {
        self.with_transaction(|tx| resource_config::load(tx, config_id))
    }

    fn find_or_create_resource_cache(
        &self,
        descriptor: &ResourceCacheDescriptor,
    ) -> Result<ResourceCache, ResourceConfigError> {
        self.with_transaction(|tx| origin::find_or_create_resource_cache(tx, descriptor))
    }

    fn find_base_resource_type(
        &self,
        name: &str,
    ) -> Result<Option<BaseResourceType>, ResourceConfigError> {
        self.with_transaction(|tx| origin::find_base_resource_type(tx, name))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a stored rowid into a typed identifier.
pub(crate) fn decode_id<T>(raw: i64, make: fn(u64) -> Option<T>) -> Result<T, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(make)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("invalid row id: {raw}")))
}

/// Converts a typed identifier's raw value into a rowid.
pub(crate) fn encode_id(raw: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(raw).map_err(|_| SqliteStoreError::Invalid(format!("row id out of range: {raw}")))
}

/// Returns the current unix epoch in milliseconds.
pub(crate) fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with foreign keys enforced.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for integrity and durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
