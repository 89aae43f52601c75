// crates/scopekeeper-core/src/lib.rs
// ============================================================================
// Module: Scopekeeper Core Library
// Description: Public API surface for the Scopekeeper core.
// Purpose: Expose core types, collaborator interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Scopekeeper core defines the canonical resource config and resource config
//! scope records shared by every pipeline that describes the same external
//! resource. It is storage-agnostic: persistence and conflict resolution live
//! in backend crates that implement the resolution operations against these
//! types.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Lock;
pub use interfaces::LockError;
pub use interfaces::LockFactory;
pub use interfaces::LockId;
pub use interfaces::ResourceConfigError;
pub use interfaces::ResourceConfigResolver;
pub use interfaces::SharedLockFactory;
pub use interfaces::StoreError;
pub use runtime::InMemoryLockFactory;
