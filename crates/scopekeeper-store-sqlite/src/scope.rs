// crates/scopekeeper-store-sqlite/src/scope.rs
// ============================================================================
// Module: Resource Config Scope Rows
// Description: Find-or-create of version-history scopes under a privacy policy.
// Purpose: Guarantee one shared scope per config and one private scope per
//          (resource, config), retiring a resource's stale private scopes.
// Dependencies: scopekeeper-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! The policy decides the owner key: a resource for private scopes, `NULL`
//! for shared ones. Each key has its own partial unique index, and the upsert
//! names the matching index as its conflict target. Retiring a resource's old
//! private scopes happens in the same transaction as the new insert.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use scopekeeper_core::ResourceConfig;
use scopekeeper_core::ResourceConfigError;
use scopekeeper_core::ResourceConfigScope;
use scopekeeper_core::ResourceConfigScopeId;
use scopekeeper_core::ResourceId;
use scopekeeper_core::ScopePolicy;
use tracing::debug;
use tracing::info;

use crate::store::SqliteStoreError;
use crate::store::decode_id;
use crate::store::encode_id;

// ============================================================================
// SECTION: Find or Create
// ============================================================================

/// Finds or creates the scope `policy` assigns to `config` and `resource`.
pub(crate) fn find_or_create(
    conn: &Connection,
    policy: ScopePolicy,
    config: &ResourceConfig,
    resource: Option<ResourceId>,
) -> Result<ResourceConfigScope, ResourceConfigError> {
    let owner = policy.scope_owner(config, resource);
    let config_id = encode_id(config.id().get())?;
    let owner_id = owner.map(|resource| encode_id(resource.get())).transpose()?;
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM resource_config_scopes WHERE resource_id IS ?1 AND \
             resource_config_id = ?2",
            params![owner_id, config_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let raw_id = match (existing, owner_id) {
        (Some(raw_id), _) => raw_id,
        (None, Some(owner_id)) => create_private(conn, owner_id, config_id)?,
        (None, None) => create_shared(conn, config_id)?,
    };
    let id = decode_id(raw_id, ResourceConfigScopeId::from_raw)?;
    debug!(
        resource_config_scope_id = %id,
        resource_config_id = %config.id(),
        private = owner.is_some(),
        "resolved resource config scope"
    );
    Ok(ResourceConfigScope::new(id, owner, config.clone()))
}

/// Retires the owner's other private scopes and upserts the new one.
fn create_private(
    conn: &Connection,
    owner_id: i64,
    config_id: i64,
) -> Result<i64, ResourceConfigError> {
    let retired = conn
        .execute(
            "DELETE FROM resource_config_scopes WHERE resource_id = ?1 AND resource_config_id != \
             ?2",
            params![owner_id, config_id],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if retired > 0 {
        info!(resource_id = owner_id, retired, "retired private resource config scopes");
    }
    let raw_id = conn
        .query_row(
            "INSERT INTO resource_config_scopes (resource_id, resource_config_id) VALUES (?1, \
             ?2) ON CONFLICT (resource_id, resource_config_id) WHERE resource_id IS NOT NULL DO \
             UPDATE SET resource_config_id = excluded.resource_config_id RETURNING id",
            params![owner_id, config_id],
            |row| row.get(0),
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(raw_id)
}

/// Upserts the config's shared scope.
fn create_shared(conn: &Connection, config_id: i64) -> Result<i64, ResourceConfigError> {
    let raw_id = conn
        .query_row(
            "INSERT INTO resource_config_scopes (resource_id, resource_config_id) VALUES (NULL, \
             ?1) ON CONFLICT (resource_config_id) WHERE resource_id IS NULL DO UPDATE SET \
             resource_config_id = excluded.resource_config_id RETURNING id",
            params![config_id],
            |row| row.get(0),
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(raw_id)
}
