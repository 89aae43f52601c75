// crates/scopekeeper-store-sqlite/src/lib.rs
// ============================================================================
// Module: Scopekeeper SQLite Store Library
// Description: SQLite-backed resource config and scope resolution.
// Purpose: Expose the durable resolver and its configuration.
// Dependencies: crate::{origin, resource_config, schema, scope, store}
// ============================================================================

//! ## Overview
//! The store persists base resource types, resource configs, resource caches,
//! and resource config scopes in one `SQLite` database. Unique indexes carry
//! the dedup guarantees; resolvers upsert against them inside immediate
//! transactions so concurrent callers converge on one row per key.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod origin;
mod resource_config;
mod schema;
mod scope;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use schema::SCHEMA_VERSION;
pub use store::SqliteResourceConfigStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
