// crates/scopekeeper-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Schema
// Description: Table and index definitions for resource configs and scopes.
// Purpose: Create the schema once and refuse databases of other versions.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! The dedup guarantees live in the unique indexes defined here; resolvers
//! name them as upsert conflict targets. Rowids use `AUTOINCREMENT` so an id
//! reclaimed by the collector is never handed to a different record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema DDL for version [`SCHEMA_VERSION`].
const SCHEMA_DDL: &str = "
    CREATE TABLE IF NOT EXISTS base_resource_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        unique_version_history INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS resource_configs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        last_referenced INTEGER NOT NULL,
        resource_cache_id INTEGER
            REFERENCES resource_caches (id) ON DELETE CASCADE,
        base_resource_type_id INTEGER
            REFERENCES base_resource_types (id) ON DELETE CASCADE,
        source_hash TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS resource_configs_resource_cache_id_source_hash_key
        ON resource_configs (resource_cache_id, source_hash);
    CREATE UNIQUE INDEX IF NOT EXISTS resource_configs_base_resource_type_id_source_hash_key
        ON resource_configs (base_resource_type_id, source_hash);
    CREATE TABLE IF NOT EXISTS resource_caches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resource_config_id INTEGER NOT NULL
            REFERENCES resource_configs (id) ON DELETE CASCADE,
        version_hash TEXT NOT NULL,
        params_hash TEXT NOT NULL,
        UNIQUE (resource_config_id, version_hash, params_hash)
    );
    CREATE TABLE IF NOT EXISTS resource_config_scopes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resource_id INTEGER,
        resource_config_id INTEGER NOT NULL
            REFERENCES resource_configs (id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS resource_config_scopes_resource_id_resource_config_id_key
        ON resource_config_scopes (resource_id, resource_config_id)
        WHERE resource_id IS NOT NULL;
    CREATE UNIQUE INDEX IF NOT EXISTS resource_config_scopes_resource_config_id_key
        ON resource_config_scopes (resource_config_id)
        WHERE resource_id IS NULL;
";

/// Initializes the `SQLite` schema or validates the existing version.
pub(crate) fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(SCHEMA_DDL).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
