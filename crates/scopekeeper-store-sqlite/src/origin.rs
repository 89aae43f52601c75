// crates/scopekeeper-store-sqlite/src/origin.rs
// ============================================================================
// Module: Origin Resolution
// Description: Resolves the parent row a resource config hangs off.
// Purpose: Find base resource types and find-or-create resource caches.
// Dependencies: scopekeeper-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! A config's parent is either a base resource type, which must already be
//! registered by worker infrastructure, or a resource cache, which is created
//! on demand after recursively resolving the cache's own config. Resolution
//! yields the parent identity plus the `resource_configs` column it belongs
//! in. All functions run inside the caller's transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use scopekeeper_core::BaseResourceType;
use scopekeeper_core::BaseResourceTypeId;
use scopekeeper_core::ConfigOrigin;
use scopekeeper_core::ResolvedOrigin;
use scopekeeper_core::ResourceCache;
use scopekeeper_core::ResourceCacheDescriptor;
use scopekeeper_core::ResourceCacheId;
use scopekeeper_core::ResourceConfigError;
use tracing::debug;
use tracing::warn;

use crate::resource_config;
use crate::store::SqliteStoreError;
use crate::store::decode_id;
use crate::store::encode_id;

// ============================================================================
// SECTION: Parent Columns
// ============================================================================

/// Column of `resource_configs` that references the parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentColumn {
    /// `resource_cache_id`
    ResourceCache,
    /// `base_resource_type_id`
    BaseResourceType,
}

impl ParentColumn {
    /// Returns the column name.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceCache => "resource_cache_id",
            Self::BaseResourceType => "base_resource_type_id",
        }
    }
}

/// A resolved parent ready to key a resource config row.
pub(crate) struct ResolvedParent {
    /// Parent record.
    pub(crate) origin: ResolvedOrigin,
    /// Column the parent id is stored in.
    pub(crate) column: ParentColumn,
    /// Parent rowid.
    pub(crate) parent_id: i64,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves or creates the parent named by `origin`.
pub(crate) fn resolve_origin(
    conn: &Connection,
    origin: &ConfigOrigin,
) -> Result<ResolvedParent, ResourceConfigError> {
    match origin {
        ConfigOrigin::ResourceCache(descriptor) => {
            let cache = find_or_create_resource_cache(conn, descriptor)?;
            Ok(ResolvedParent {
                column: ParentColumn::ResourceCache,
                parent_id: encode_id(cache.id.get())?,
                origin: ResolvedOrigin::ResourceCache(cache),
            })
        }
        ConfigOrigin::BaseResourceType(reference) => {
            // Base types are provisioned by worker registration, never here.
            let Some(base) = find_base_resource_type(conn, &reference.name)? else {
                warn!(name = %reference.name, "base resource type not found");
                return Err(ResourceConfigError::BaseResourceTypeNotFound {
                    name: reference.name.clone(),
                });
            };
            Ok(ResolvedParent {
                column: ParentColumn::BaseResourceType,
                parent_id: encode_id(base.id.get())?,
                origin: ResolvedOrigin::BaseResourceType(base),
            })
        }
    }
}

/// Looks up a base resource type by name.
pub(crate) fn find_base_resource_type(
    conn: &Connection,
    name: &str,
) -> Result<Option<BaseResourceType>, ResourceConfigError> {
    let row: Option<(i64, bool)> = conn
        .query_row(
            "SELECT id, unique_version_history FROM base_resource_types WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let Some((raw_id, unique_version_history)) = row else {
        return Ok(None);
    };
    Ok(Some(BaseResourceType {
        id: decode_id(raw_id, BaseResourceTypeId::from_raw)?,
        name: name.to_string(),
        unique_version_history,
    }))
}

/// Looks up a base resource type by rowid.
pub(crate) fn find_base_resource_type_by_id(
    conn: &Connection,
    raw_id: i64,
) -> Result<Option<BaseResourceType>, ResourceConfigError> {
    let row: Option<(String, bool)> = conn
        .query_row(
            "SELECT name, unique_version_history FROM base_resource_types WHERE id = ?1",
            params![raw_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let Some((name, unique_version_history)) = row else {
        return Ok(None);
    };
    Ok(Some(BaseResourceType {
        id: decode_id(raw_id, BaseResourceTypeId::from_raw)?,
        name,
        unique_version_history,
    }))
}

/// Returns the config rowid a resource cache was fetched from.
pub(crate) fn resource_cache_config_id(
    conn: &Connection,
    raw_id: i64,
) -> Result<Option<i64>, ResourceConfigError> {
    let config_id = conn
        .query_row(
            "SELECT resource_config_id FROM resource_caches WHERE id = ?1",
            params![raw_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(config_id)
}

// ============================================================================
// SECTION: Resource Caches
// ============================================================================

/// Finds or creates a resource cache, resolving its own config first.
pub(crate) fn find_or_create_resource_cache(
    conn: &Connection,
    descriptor: &ResourceCacheDescriptor,
) -> Result<ResourceCache, ResourceConfigError> {
    let config = resource_config::find_or_create(conn, &descriptor.resource_config)?;
    let config_id = encode_id(config.id().get())?;
    let version_hash = descriptor.version_hash()?;
    let params_hash = descriptor.params_hash()?;
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM resource_caches WHERE resource_config_id = ?1 AND version_hash = ?2 \
             AND params_hash = ?3",
            params![config_id, version_hash.as_str(), params_hash.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let raw_id = if let Some(raw_id) = existing {
        raw_id
    } else {
        conn.query_row(
            "INSERT INTO resource_caches (resource_config_id, version_hash, params_hash) VALUES \
             (?1, ?2, ?3) ON CONFLICT (resource_config_id, version_hash, params_hash) DO UPDATE \
             SET resource_config_id = excluded.resource_config_id RETURNING id",
            params![config_id, version_hash.as_str(), params_hash.as_str()],
            |row| row.get(0),
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?
    };
    let id = decode_id(raw_id, ResourceCacheId::from_raw)?;
    debug!(resource_cache_id = %id, resource_config_id = %config.id(), "resolved resource cache");
    Ok(ResourceCache {
        id,
        resource_config: Arc::new(config),
    })
}
