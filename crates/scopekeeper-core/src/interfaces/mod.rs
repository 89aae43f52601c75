// crates/scopekeeper-core/src/interfaces/mod.rs
// ============================================================================
// Module: Scopekeeper Interfaces
// Description: Backend-agnostic resolution, storage error, and lock contracts.
// Purpose: Define the seams between the resolvers and their collaborators.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! [`ResourceConfigResolver`] is the contract every storage backend fulfils:
//! find-or-create of canonical configs and scopes, freshness stamping, and
//! the supporting lookups. [`LockFactory`] is the opaque lock capability
//! consumed for coarse serialization such as one in-flight check per scope.
//! Implementations must never return two identities for one dedup key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::BaseResourceType;
use crate::core::HashError;
use crate::core::ResourceCache;
use crate::core::ResourceCacheDescriptor;
use crate::core::ResourceConfig;
use crate::core::ResourceConfigDescriptor;
use crate::core::ResourceConfigId;
use crate::core::ResourceConfigScope;
use crate::core::ResourceConfigScopeId;
use crate::core::ResourceId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage-layer errors surfaced through the resolvers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("resource config store io error: {0}")]
    Io(String),
    /// Store data version is incompatible.
    #[error("resource config store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("resource config store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("resource config store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Resolution Errors
// ============================================================================

/// Errors raised while resolving or refreshing resource configs and scopes.
///
/// The `AlreadyExists`, `Disappeared`, `ParentDisappeared`, and `HasNoType`
/// sentinels tell callers to re-resolve from the descriptor rather than retry
/// the same call.
#[derive(Debug, Error)]
pub enum ResourceConfigError {
    /// The descriptor names a base resource type no worker has registered.
    #[error("base resource type not found: {name}")]
    BaseResourceTypeNotFound {
        /// Requested base resource type name.
        name: String,
    },
    /// A uniqueness constraint fired outside the upsert path.
    #[error("resource config already exists")]
    AlreadyExists,
    /// The config row was deleted after it was resolved.
    #[error("resource config disappeared")]
    Disappeared,
    /// A parent row referenced by the config was deleted.
    #[error("resource config parent disappeared")]
    ParentDisappeared,
    /// A stored config row names neither parent kind.
    #[error("resource config has no type")]
    HasNoType,
    /// Hashing a source, version, or params map failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Lock acquisition failed.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Find-or-create engine for canonical resource configs and scopes.
pub trait ResourceConfigResolver {
    /// Resolves the descriptor's origin and finds or creates its config.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::BaseResourceTypeNotFound`] for unknown
    /// base types, or any storage error; nothing is committed on failure.
    fn find_or_create_resource_config(
        &self,
        descriptor: &ResourceConfigDescriptor,
    ) -> Result<ResourceConfig, ResourceConfigError>;

    /// Finds or creates the scope of an already-resolved config.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::Disappeared`] when the config row is
    /// gone, or any storage error.
    fn find_or_create_scope(
        &self,
        config: &ResourceConfig,
        resource: Option<ResourceId>,
    ) -> Result<ResourceConfigScope, ResourceConfigError>;

    /// Resolves origin, config, and scope in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns any error of the two steps; nothing is committed on failure.
    fn resolve_scope(
        &self,
        descriptor: &ResourceConfigDescriptor,
        resource: Option<ResourceId>,
    ) -> Result<ResourceConfigScope, ResourceConfigError>;

    /// Stamps the config's last-referenced time with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::Disappeared`] when the config row is gone.
    fn update_last_referenced(
        &self,
        config_id: ResourceConfigId,
    ) -> Result<Timestamp, ResourceConfigError>;

    /// Loads a config and its full origin chain by identity.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceConfigError::ParentDisappeared`] or
    /// [`ResourceConfigError::HasNoType`] when the stored chain is
    /// inconsistent.
    fn find_resource_config(
        &self,
        config_id: ResourceConfigId,
    ) -> Result<Option<ResourceConfig>, ResourceConfigError>;

    /// Finds or creates a resource cache, resolving its config first.
    ///
    /// # Errors
    ///
    /// Returns any error of config resolution or storage.
    fn find_or_create_resource_cache(
        &self,
        descriptor: &ResourceCacheDescriptor,
    ) -> Result<ResourceCache, ResourceConfigError>;

    /// Looks up a base resource type by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the lookup fails.
    fn find_base_resource_type(
        &self,
        name: &str,
    ) -> Result<Option<BaseResourceType>, ResourceConfigError>;
}

// ============================================================================
// SECTION: Lock Gate
// ============================================================================

/// Identity of a lock managed by a [`LockFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LockId {
    /// Serializes checks of a single scope.
    ResourceScopeChecking(ResourceConfigScopeId),
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceScopeChecking(scope_id) => write!(f, "resource-scope-checking:{scope_id}"),
        }
    }
}

/// Lock acquisition errors.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock backend failed.
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// A held lock.
pub trait Lock: Send {
    /// Returns the lock identity.
    fn id(&self) -> LockId;

    /// Releases the lock.
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] when the backend fails to release.
    fn release(self: Box<Self>) -> Result<(), LockError>;
}

/// Opaque lock acquisition capability.
pub trait LockFactory {
    /// Attempts to acquire `id` without blocking; `None` means it is held elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] when the backend fails.
    fn acquire(&self, id: LockId) -> Result<Option<Box<dyn Lock>>, LockError>;
}

/// Shared lock factory backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedLockFactory {
    /// Inner factory implementation.
    inner: Arc<dyn LockFactory + Send + Sync>,
}

impl SharedLockFactory {
    /// Wraps a lock factory in a shared, clonable wrapper.
    #[must_use]
    pub fn from_factory(factory: impl LockFactory + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(factory),
        }
    }
}

impl LockFactory for SharedLockFactory {
    fn acquire(&self, id: LockId) -> Result<Option<Box<dyn Lock>>, LockError> {
        self.inner.acquire(id)
    }
}
