// crates/scopekeeper-store-sqlite/src/resource_config.rs
// ============================================================================
// Module: Resource Config Rows
// Description: Find-or-create, freshness, and loading of resource configs.
// Purpose: Guarantee one canonical row per (origin, source hash).
// Dependencies: scopekeeper-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Resolution selects first and falls back to an upsert whose conflict target
//! is the (parent, `source_hash`) unique index. The upsert's `DO UPDATE`
//! writes back the same values so `RETURNING` always yields the surviving
//! row, which makes the insert double as an existence check when a concurrent
//! resolver got there first. Loading rebuilds the origin chain from rows and
//! reports an inconsistent chain through the resolution sentinels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::ffi;
use rusqlite::params;
use scopekeeper_core::ResolvedOrigin;
use scopekeeper_core::ResourceCache;
use scopekeeper_core::ResourceCacheId;
use scopekeeper_core::ResourceConfig;
use scopekeeper_core::ResourceConfigDescriptor;
use scopekeeper_core::ResourceConfigError;
use scopekeeper_core::ResourceConfigId;
use scopekeeper_core::SourceHash;
use scopekeeper_core::Timestamp;
use tracing::debug;
use tracing::warn;

use crate::origin::find_base_resource_type_by_id;
use crate::origin::resolve_origin;
use crate::origin::resource_cache_config_id;
use crate::store::SqliteStoreError;
use crate::store::decode_id;
use crate::store::encode_id;
use crate::store::unix_millis;

// ============================================================================
// SECTION: Find or Create
// ============================================================================

/// Resolves the descriptor's origin and finds or creates its config row.
pub(crate) fn find_or_create(
    conn: &Connection,
    descriptor: &ResourceConfigDescriptor,
) -> Result<ResourceConfig, ResourceConfigError> {
    let parent = resolve_origin(conn, &descriptor.origin)?;
    let source_hash = descriptor.source_hash()?;
    let column = parent.column.as_str();
    let existing: Option<(i64, i64)> = conn
        .query_row(
            &format!(
                "SELECT id, last_referenced FROM resource_configs WHERE {column} = ?1 AND \
                 source_hash = ?2"
            ),
            params![parent.parent_id, source_hash.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let (raw_id, last_referenced) = if let Some(row) = existing {
        row
    } else {
        conn.query_row(
            &format!(
                "INSERT INTO resource_configs ({column}, source_hash, last_referenced) VALUES \
                 (?1, ?2, ?3) ON CONFLICT ({column}, source_hash) DO UPDATE SET {column} = \
                 excluded.{column}, source_hash = excluded.source_hash RETURNING id, \
                 last_referenced"
            ),
            params![parent.parent_id, source_hash.as_str(), unix_millis()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(classify_insert_error)?
    };
    let id = decode_id(raw_id, ResourceConfigId::from_raw)?;
    debug!(resource_config_id = %id, parent = column, "resolved resource config");
    Ok(ResourceConfig::new(
        id,
        Timestamp::from_unix_millis(last_referenced),
        parent.origin,
        source_hash,
    ))
}

/// Maps constraint failures of a config insert onto resolution sentinels.
fn classify_insert_error(err: rusqlite::Error) -> ResourceConfigError {
    match err.sqlite_error().map(|code| code.extended_code) {
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            warn!(error = %err, "resource config parent disappeared during insert");
            ResourceConfigError::ParentDisappeared
        }
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            warn!(error = %err, "resource config insert hit a uniqueness constraint");
            ResourceConfigError::AlreadyExists
        }
        _ => SqliteStoreError::Db(err.to_string()).into(),
    }
}

// ============================================================================
// SECTION: Freshness
// ============================================================================

/// Returns true when the config row still exists.
pub(crate) fn exists(conn: &Connection, id: ResourceConfigId) -> Result<bool, ResourceConfigError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM resource_configs WHERE id = ?1",
            params![encode_id(id.get())?],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(found.is_some())
}

/// Stamps the config with the current time; `None` when the row is gone.
pub(crate) fn update_last_referenced(
    conn: &Connection,
    id: ResourceConfigId,
) -> Result<Option<Timestamp>, ResourceConfigError> {
    let stamped: Option<i64> = conn
        .query_row(
            "UPDATE resource_configs SET last_referenced = ?2 WHERE id = ?1 RETURNING \
             last_referenced",
            params![encode_id(id.get())?, unix_millis()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if stamped.is_some() {
        debug!(resource_config_id = %id, "refreshed resource config");
    }
    Ok(stamped.map(Timestamp::from_unix_millis))
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Stored columns of one config row.
struct ConfigRow {
    /// Last-referenced time in unix millis.
    last_referenced: i64,
    /// Parent resource cache rowid.
    resource_cache_id: Option<i64>,
    /// Parent base resource type rowid.
    base_resource_type_id: Option<i64>,
    /// Stored source hash.
    source_hash: String,
}

/// Loads a config and its full origin chain; `None` when the row is gone.
pub(crate) fn load(
    conn: &Connection,
    id: ResourceConfigId,
) -> Result<Option<ResourceConfig>, ResourceConfigError> {
    load_raw(conn, encode_id(id.get())?)
}

/// Loads a config by rowid.
fn load_raw(conn: &Connection, raw_id: i64) -> Result<Option<ResourceConfig>, ResourceConfigError> {
    let row = conn
        .query_row(
            "SELECT last_referenced, resource_cache_id, base_resource_type_id, source_hash FROM \
             resource_configs WHERE id = ?1",
            params![raw_id],
            |row| {
                Ok(ConfigRow {
                    last_referenced: row.get(0)?,
                    resource_cache_id: row.get(1)?,
                    base_resource_type_id: row.get(2)?,
                    source_hash: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let Some(row) = row else {
        return Ok(None);
    };
    let id = decode_id(raw_id, ResourceConfigId::from_raw)?;
    let origin = match (row.resource_cache_id, row.base_resource_type_id) {
        (Some(cache_id), None) => ResolvedOrigin::ResourceCache(load_cache(conn, cache_id)?),
        (None, Some(base_id)) => {
            let Some(base) = find_base_resource_type_by_id(conn, base_id)? else {
                warn!(resource_config_id = %id, "base resource type of config disappeared");
                return Err(ResourceConfigError::ParentDisappeared);
            };
            ResolvedOrigin::BaseResourceType(base)
        }
        (None, None) => {
            warn!(resource_config_id = %id, "resource config has no type");
            return Err(ResourceConfigError::HasNoType);
        }
        (Some(_), Some(_)) => {
            return Err(SqliteStoreError::Invalid(format!(
                "resource config {id} names two parents"
            ))
            .into());
        }
    };
    Ok(Some(ResourceConfig::new(
        id,
        Timestamp::from_unix_millis(row.last_referenced),
        origin,
        SourceHash::from_stored(row.source_hash),
    )))
}

/// Loads a parent resource cache together with its own config.
fn load_cache(conn: &Connection, cache_id: i64) -> Result<ResourceCache, ResourceConfigError> {
    let Some(config_id) = resource_cache_config_id(conn, cache_id)? else {
        warn!(resource_cache_id = cache_id, "resource cache of config disappeared");
        return Err(ResourceConfigError::ParentDisappeared);
    };
    let Some(config) = load_raw(conn, config_id)? else {
        warn!(resource_cache_id = cache_id, "config of resource cache disappeared");
        return Err(ResourceConfigError::ParentDisappeared);
    };
    Ok(ResourceCache {
        id: decode_id(cache_id, ResourceCacheId::from_raw)?,
        resource_config: Arc::new(config),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
