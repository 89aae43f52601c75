// crates/scopekeeper-store-sqlite/tests/scope_policy.rs
// ============================================================================
// Module: SQLite Scope Policy Tests
// Description: Private versus shared scope resolution.
// Purpose: Validate the global-resources and unique-history policy matrix.
// ============================================================================

//! ## Overview
//! Each test resolves scopes for two resources sharing one source config:
//! - Global resources disabled keeps every history private
//! - Global resources enabled shares history unless the type opts out
//! - Switching a private resource to a new config retires its old scope

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::params;
use scopekeeper_core::InMemoryLockFactory;
use scopekeeper_core::ResourceConfigDescriptor;
use scopekeeper_core::ResourceConfigResolver;
use scopekeeper_core::ResourceConfigScopeId;
use scopekeeper_core::ResourceId;
use scopekeeper_core::ScopePolicy;
use scopekeeper_core::SharedLockFactory;
use scopekeeper_core::Source;
use scopekeeper_store_sqlite::SqliteResourceConfigStore;
use scopekeeper_store_sqlite::SqliteStoreConfig;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn db_path(temp: &TempDir) -> PathBuf {
    temp.path().join("scopekeeper.db")
}

fn open_store(path: &Path, global_resources: bool) -> SqliteResourceConfigStore {
    SqliteResourceConfigStore::new(
        &SqliteStoreConfig::for_path(path),
        ScopePolicy::new(global_resources),
        SharedLockFactory::from_factory(InMemoryLockFactory::new()),
    )
    .expect("store init")
}

fn descriptor(uri: &str) -> ResourceConfigDescriptor {
    let mut source = Source::new();
    source.insert("uri".to_string(), json!(uri));
    ResourceConfigDescriptor::from_base_type("git", source)
}

fn resource(raw: u64) -> Option<ResourceId> {
    Some(ResourceId::from_raw(raw).unwrap())
}

fn scope_exists(path: &Path, id: ResourceConfigScopeId) -> bool {
    let conn = Connection::open(path).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM resource_config_scopes WHERE id = ?1",
            params![i64::try_from(id.get()).unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    count == 1
}

// ============================================================================
// SECTION: Policy Matrix
// ============================================================================

#[test]
fn global_resources_disabled_gives_each_resource_a_private_scope() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&db_path(&temp), false);
    store.register_base_resource_type("git", false).unwrap();
    let config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();

    let first = store.find_or_create_scope(&config, resource(1)).unwrap();
    let second = store.find_or_create_scope(&config, resource(2)).unwrap();

    assert_ne!(first.id(), second.id());
    assert!(first.is_private());
    assert!(second.is_private());
    assert_eq!(first.resource(), resource(1));
    assert_eq!(second.resource(), resource(2));
}

#[test]
fn global_resources_enabled_shares_scope_for_non_unique_types() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&db_path(&temp), true);
    store.register_base_resource_type("git", false).unwrap();
    let config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();

    let first = store.find_or_create_scope(&config, resource(1)).unwrap();
    let second = store.find_or_create_scope(&config, resource(2)).unwrap();

    assert_eq!(first.id(), second.id());
    assert!(!first.is_private());
    assert_eq!(first.resource(), None);
}

#[test]
fn global_resources_enabled_keeps_unique_types_private() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&db_path(&temp), true);
    store.register_base_resource_type("git", true).unwrap();
    let config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();

    let first = store.find_or_create_scope(&config, resource(1)).unwrap();
    let second = store.find_or_create_scope(&config, resource(2)).unwrap();

    assert_ne!(first.id(), second.id());
    assert!(first.is_private());
    assert!(second.is_private());
}

#[test]
fn switching_a_private_resource_retires_its_old_scope() {
    let temp = TempDir::new().unwrap();
    let path = db_path(&temp);
    let store = open_store(&path, true);
    store.register_base_resource_type("git", true).unwrap();
    let old_config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();
    let new_config = store.find_or_create_resource_config(&descriptor("https://b")).unwrap();

    let old_scope = store.find_or_create_scope(&old_config, resource(1)).unwrap();
    let neighbour = store.find_or_create_scope(&old_config, resource(2)).unwrap();
    let new_scope = store.find_or_create_scope(&new_config, resource(1)).unwrap();

    assert_ne!(old_scope.id(), new_scope.id());
    assert!(!scope_exists(&path, old_scope.id()));
    assert!(scope_exists(&path, new_scope.id()));
    assert!(scope_exists(&path, neighbour.id()));

    let back = store.find_or_create_scope(&old_config, resource(1)).unwrap();
    assert_ne!(back.id(), old_scope.id());
    assert!(!scope_exists(&path, new_scope.id()));
}

#[test]
fn repeated_private_resolution_keeps_the_scope() {
    let temp = TempDir::new().unwrap();
    let path = db_path(&temp);
    let store = open_store(&path, false);
    store.register_base_resource_type("git", false).unwrap();
    let config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();

    let first = store.find_or_create_scope(&config, resource(1)).unwrap();
    let second = store.find_or_create_scope(&config, resource(1)).unwrap();

    assert_eq!(first.id(), second.id());
    assert!(scope_exists(&path, first.id()));
}

#[test]
fn scope_without_resource_is_shared_even_when_global_resources_disabled() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&db_path(&temp), false);
    store.register_base_resource_type("git", true).unwrap();
    let config = store.find_or_create_resource_config(&descriptor("https://a")).unwrap();

    let first = store.find_or_create_scope(&config, None).unwrap();
    let second = store.find_or_create_scope(&config, None).unwrap();

    assert_eq!(first.id(), second.id());
    assert!(!first.is_private());
}

#[test]
fn switching_to_shared_leaves_the_private_scope_in_place() {
    let temp = TempDir::new().unwrap();
    let path = db_path(&temp);
    let private_store = open_store(&path, false);
    private_store.register_base_resource_type("git", false).unwrap();
    let config = private_store.find_or_create_resource_config(&descriptor("https://a")).unwrap();
    let private = private_store.find_or_create_scope(&config, resource(1)).unwrap();

    let shared_store = open_store(&path, true);
    let shared = shared_store.find_or_create_scope(&config, resource(1)).unwrap();

    assert_ne!(private.id(), shared.id());
    assert!(private.is_private());
    assert!(!shared.is_private());
    assert!(scope_exists(&path, private.id()));
}
