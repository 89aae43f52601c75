// crates/scopekeeper-core/src/core/descriptor.rs
// ============================================================================
// Module: Scopekeeper Descriptors
// Description: Caller-side descriptions of resource configs and caches.
// Purpose: Describe what should be resolved before any row exists.
// Dependencies: serde, crate::core::hashing
// ============================================================================

//! ## Overview
//! Resources, resource types, and task image references all reduce to a
//! [`ResourceConfigDescriptor`]: an origin plus a source configuration. The
//! origin is a tagged union, so a descriptor always names exactly one parent
//! kind. A resource type provided by another resource nests a full
//! [`ResourceCacheDescriptor`], which in turn carries its own config
//! descriptor; the nesting bottoms out at a base resource type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashError;
use crate::core::hashing::Source;
use crate::core::hashing::SourceHash;
use crate::core::hashing::hash_canonical_json;
use crate::core::hashing::source_hash;

// ============================================================================
// SECTION: Origins
// ============================================================================

/// Name-only reference to a base resource type provided by workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseResourceTypeRef {
    /// Registered base resource type name (for example `git`).
    pub name: String,
}

impl BaseResourceTypeRef {
    /// Creates a reference to the named base resource type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
        }
    }
}

/// Parent of a resource config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConfigOrigin {
    /// A resource type provided by running another resource.
    ResourceCache(Box<ResourceCacheDescriptor>),
    /// A resource type provided by a worker.
    BaseResourceType(BaseResourceTypeRef),
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Description of a resource type implementation plus its source config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfigDescriptor {
    /// Where the resource type implementation comes from.
    pub origin: ConfigOrigin,
    /// The resource's source configuration.
    pub source: Source,
}

impl ResourceConfigDescriptor {
    /// Describes a config whose type is a worker-provided base resource type.
    #[must_use]
    pub fn from_base_type(name: impl Into<String>, source: Source) -> Self {
        Self {
            origin: ConfigOrigin::BaseResourceType(BaseResourceTypeRef::new(name)),
            source,
        }
    }

    /// Describes a config whose type is provided by a resource cache.
    #[must_use]
    pub fn from_resource_cache(cache: ResourceCacheDescriptor, source: Source) -> Self {
        Self {
            origin: ConfigOrigin::ResourceCache(Box::new(cache)),
            source,
        }
    }

    /// Returns the dedup hash of the source configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the source cannot be canonicalized.
    pub fn source_hash(&self) -> Result<SourceHash, HashError> {
        source_hash(&self.source)
    }
}

/// Description of a fetched version of a resource, used as a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCacheDescriptor {
    /// Config of the resource that produced the cached version.
    pub resource_config: ResourceConfigDescriptor,
    /// The fetched version.
    pub version: BTreeMap<String, String>,
    /// Params used for the fetch.
    #[serde(default)]
    pub params: Source,
}

impl ResourceCacheDescriptor {
    /// Returns the dedup hash of the version.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the version cannot be canonicalized.
    pub fn version_hash(&self) -> Result<SourceHash, HashError> {
        hash_canonical_json(&self.version)
    }

    /// Returns the dedup hash of the params.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the params cannot be canonicalized.
    pub fn params_hash(&self) -> Result<SourceHash, HashError> {
        hash_canonical_json(&self.params)
    }
}
