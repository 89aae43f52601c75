// crates/scopekeeper-core/src/core/records.rs
// ============================================================================
// Module: Scopekeeper Resolved Records
// Description: Canonical rows returned by resolution.
// Purpose: Give callers read-only, side-effect-free views of resolved state.
// Dependencies: crate::core::{hashing, identifiers, time}
// ============================================================================

//! ## Overview
//! Records mirror persisted rows. A [`ResourceConfig`] holds its resolved
//! origin; when that origin is a resource cache, the cache shares its own
//! resolved config through an [`Arc`], so walking to the root base resource
//! type never touches the store. The chain is acyclic because a cache's
//! config is always inserted before any config that names the cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::hashing::SourceHash;
use crate::core::identifiers::BaseResourceTypeId;
use crate::core::identifiers::ResourceCacheId;
use crate::core::identifiers::ResourceConfigId;
use crate::core::identifiers::ResourceConfigScopeId;
use crate::core::identifiers::ResourceId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Parents
// ============================================================================

/// A worker-provided resource type as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseResourceType {
    /// Store identity.
    pub id: BaseResourceTypeId,
    /// Registered name.
    pub name: String,
    /// Whether every consuming resource must get a private version history.
    pub unique_version_history: bool,
}

/// A resource type sourced from a fetched version of another resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCache {
    /// Store identity.
    pub id: ResourceCacheId,
    /// Config of the resource the cache was fetched from.
    pub resource_config: Arc<ResourceConfig>,
}

/// Resolved parent of a resource config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOrigin {
    /// Created by a resource cache.
    ResourceCache(ResourceCache),
    /// Created by a base resource type.
    BaseResourceType(BaseResourceType),
}

// ============================================================================
// SECTION: Resource Config
// ============================================================================

/// Canonical identity of a resource type implementation plus source config.
///
/// # Invariants
/// - (origin, `source_hash`) is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Store identity.
    id: ResourceConfigId,
    /// Last time a collaborator marked the config as in use.
    last_referenced: Timestamp,
    /// Parent that created the config.
    origin: ResolvedOrigin,
    /// Dedup hash of the source configuration.
    source_hash: SourceHash,
}

impl ResourceConfig {
    /// Assembles a record from stored values.
    #[must_use]
    pub const fn new(
        id: ResourceConfigId,
        last_referenced: Timestamp,
        origin: ResolvedOrigin,
        source_hash: SourceHash,
    ) -> Self {
        Self {
            id,
            last_referenced,
            origin,
            source_hash,
        }
    }

    /// Returns the store identity.
    #[must_use]
    pub const fn id(&self) -> ResourceConfigId {
        self.id
    }

    /// Returns the last-referenced time observed when the record was read.
    #[must_use]
    pub const fn last_referenced(&self) -> Timestamp {
        self.last_referenced
    }

    /// Returns the source hash.
    #[must_use]
    pub const fn source_hash(&self) -> &SourceHash {
        &self.source_hash
    }

    /// Returns the resource cache that created this config, if any.
    #[must_use]
    pub const fn created_by_resource_cache(&self) -> Option<&ResourceCache> {
        match &self.origin {
            ResolvedOrigin::ResourceCache(cache) => Some(cache),
            ResolvedOrigin::BaseResourceType(_) => None,
        }
    }

    /// Returns the base resource type that created this config, if any.
    #[must_use]
    pub const fn created_by_base_resource_type(&self) -> Option<&BaseResourceType> {
        match &self.origin {
            ResolvedOrigin::BaseResourceType(base) => Some(base),
            ResolvedOrigin::ResourceCache(_) => None,
        }
    }

    /// Walks the origin chain down to the worker-provided base resource type.
    #[must_use]
    pub fn origin_base_resource_type(&self) -> &BaseResourceType {
        match &self.origin {
            ResolvedOrigin::BaseResourceType(base) => base,
            ResolvedOrigin::ResourceCache(cache) => {
                cache.resource_config.origin_base_resource_type()
            }
        }
    }
}

// ============================================================================
// SECTION: Resource Config Scope
// ============================================================================

/// Canonical version-history timeline for a config.
///
/// # Invariants
/// - `resource` is `Some` only for private scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfigScope {
    /// Store identity.
    id: ResourceConfigScopeId,
    /// Owning resource for private scopes.
    resource: Option<ResourceId>,
    /// Config the timeline belongs to.
    resource_config: ResourceConfig,
}

impl ResourceConfigScope {
    /// Assembles a record from stored values.
    #[must_use]
    pub const fn new(
        id: ResourceConfigScopeId,
        resource: Option<ResourceId>,
        resource_config: ResourceConfig,
    ) -> Self {
        Self {
            id,
            resource,
            resource_config,
        }
    }

    /// Returns the store identity.
    #[must_use]
    pub const fn id(&self) -> ResourceConfigScopeId {
        self.id
    }

    /// Returns the owning resource when the scope is private.
    #[must_use]
    pub const fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    /// Returns true when the scope is private to one resource.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.resource.is_some()
    }

    /// Returns the config this scope belongs to.
    #[must_use]
    pub const fn resource_config(&self) -> &ResourceConfig {
        &self.resource_config
    }
}
