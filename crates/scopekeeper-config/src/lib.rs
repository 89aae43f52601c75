// crates/scopekeeper-config/src/lib.rs
// ============================================================================
// Module: Scopekeeper Config Library
// Description: Configuration model, validation, and runtime wiring.
// Purpose: Single source of truth for scopekeeper.toml semantics.
// Dependencies: scopekeeper-core, scopekeeper-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `scopekeeper-config` loads `scopekeeper.toml`, validates it fail-closed,
//! installs the tracing subscriber, and opens the resource config store with
//! the configured scope policy.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use logging::init_tracing;
