// crates/scopekeeper-core/src/runtime/mod.rs
// ============================================================================
// Module: Scopekeeper Runtime
// Description: In-process implementations of collaborator interfaces.
// Purpose: Provide dependency-free collaborators for tests and single-node hosts.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime helpers implement the collaborator traits without external
//! services. They are suitable for tests and single-process deployments.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod lock;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lock::InMemoryLockFactory;
