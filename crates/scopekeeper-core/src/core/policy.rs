// crates/scopekeeper-core/src/core/policy.rs
// ============================================================================
// Module: Scopekeeper Scope Policy
// Description: Decides whether a version history is shared or resource-private.
// Purpose: Keep the global-resources switch an explicit, per-call input.
// Dependencies: serde, crate::core::{identifiers, records}
// ============================================================================

//! ## Overview
//! With global resources disabled every resource keeps its own history,
//! which is the behavior before global resources existed. With them enabled,
//! resources sharing a config share one history unless the root base resource
//! type demands unique version history.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ResourceId;
use crate::core::records::ResourceConfig;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Scope privacy policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopePolicy {
    /// Whether identical configs share version history across resources.
    #[serde(default)]
    pub global_resources: bool,
}

impl ScopePolicy {
    /// Creates a policy with the given global-resources switch.
    #[must_use]
    pub const fn new(global_resources: bool) -> Self {
        Self {
            global_resources,
        }
    }

    /// Returns the owner a scope for `config` should be keyed on.
    ///
    /// `None` means the scope is shared; without an owning resource there is
    /// nothing to be private to.
    #[must_use]
    pub fn scope_owner(
        &self,
        config: &ResourceConfig,
        resource: Option<ResourceId>,
    ) -> Option<ResourceId> {
        let resource = resource?;
        let private =
            !self.global_resources || config.origin_base_resource_type().unique_version_history;
        private.then_some(resource)
    }
}
