// crates/scopekeeper-core/src/core/mod.rs
// ============================================================================
// Module: Scopekeeper Core Types
// Description: Canonical resource config records, descriptors, and policy.
// Purpose: Provide stable, strongly typed values shared by every backend.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Core types split into three layers: descriptors (what a caller asks for),
//! resolved records (what the store returned), and the scope policy that
//! decides whether a version history is shared or private.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod descriptor;
pub mod hashing;
pub mod identifiers;
pub mod policy;
pub mod records;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptor::BaseResourceTypeRef;
pub use descriptor::ConfigOrigin;
pub use descriptor::ResourceCacheDescriptor;
pub use descriptor::ResourceConfigDescriptor;
pub use hashing::HashError;
pub use hashing::Source;
pub use hashing::SourceHash;
pub use identifiers::BaseResourceTypeId;
pub use identifiers::ResourceCacheId;
pub use identifiers::ResourceConfigId;
pub use identifiers::ResourceConfigScopeId;
pub use identifiers::ResourceId;
pub use policy::ScopePolicy;
pub use records::BaseResourceType;
pub use records::ResolvedOrigin;
pub use records::ResourceCache;
pub use records::ResourceConfig;
pub use records::ResourceConfigScope;
pub use time::Timestamp;
