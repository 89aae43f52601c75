// crates/scopekeeper-store-sqlite/tests/concurrency.rs
// ============================================================================
// Module: SQLite Concurrency Tests
// Description: Racing resolvers on independent connections.
// Purpose: Validate that concurrent find-or-create converges on one row.
// ============================================================================

//! ## Overview
//! Every worker opens its own store handle on a shared database file and
//! waits on a barrier before resolving, so the inserts genuinely race.

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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use rusqlite::Connection;
use scopekeeper_core::InMemoryLockFactory;
use scopekeeper_core::ResourceCacheDescriptor;
use scopekeeper_core::ResourceConfigDescriptor;
use scopekeeper_core::ResourceConfigResolver;
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

const WORKERS: usize = 8;

fn open_handles(path: &Path, global_resources: bool) -> Vec<SqliteResourceConfigStore> {
    let locks = SharedLockFactory::from_factory(InMemoryLockFactory::new());
    let mut config = SqliteStoreConfig::for_path(path);
    config.busy_timeout_ms = 30_000;
    (0 .. WORKERS)
        .map(|_| {
            SqliteResourceConfigStore::new(
                &config,
                ScopePolicy::new(global_resources),
                locks.clone(),
            )
            .expect("store init")
        })
        .collect()
}

fn cached_descriptor() -> ResourceConfigDescriptor {
    let mut inner = Source::new();
    inner.insert("uri".to_string(), json!("https://a"));
    let mut outer = Source::new();
    outer.insert("repository".to_string(), json!("registry/image"));
    ResourceConfigDescriptor::from_resource_cache(
        ResourceCacheDescriptor {
            resource_config: ResourceConfigDescriptor::from_base_type("git", inner),
            version: BTreeMap::from([("ref".to_string(), "abc".to_string())]),
            params: Source::new(),
        },
        outer,
    )
}

fn count_rows(path: &Path, table: &str) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0)).unwrap()
}

// ============================================================================
// SECTION: Races
// ============================================================================

#[test]
fn racing_config_resolution_converges_on_one_row() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scopekeeper.db");
    let handles = open_handles(&path, false);
    handles[0].register_base_resource_type("git", false).unwrap();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let workers: Vec<_> = handles
        .into_iter()
        .map(|store| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.find_or_create_resource_config(&cached_descriptor()).unwrap().id()
            })
        })
        .collect();
    let ids: BTreeSet<_> = workers.into_iter().map(|worker| worker.join().unwrap()).collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(count_rows(&path, "resource_configs"), 2);
    assert_eq!(count_rows(&path, "resource_caches"), 1);
}

#[test]
fn racing_shared_scope_resolution_converges_on_one_scope() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scopekeeper.db");
    let handles = open_handles(&path, true);
    handles[0].register_base_resource_type("git", false).unwrap();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let workers: Vec<_> = handles
        .into_iter()
        .enumerate()
        .map(|(index, store)| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let resource = ResourceId::from_raw(u64::try_from(index).unwrap() + 1);
                barrier.wait();
                store.resolve_scope(&cached_descriptor(), resource).unwrap().id()
            })
        })
        .collect();
    let ids: BTreeSet<_> = workers.into_iter().map(|worker| worker.join().unwrap()).collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(count_rows(&path, "resource_config_scopes"), 1);
}

#[test]
fn racing_private_scope_resolution_for_one_resource_converges() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scopekeeper.db");
    let handles = open_handles(&path, false);
    handles[0].register_base_resource_type("git", false).unwrap();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let workers: Vec<_> = handles
        .into_iter()
        .map(|store| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.resolve_scope(&cached_descriptor(), ResourceId::from_raw(1)).unwrap().id()
            })
        })
        .collect();
    let ids: BTreeSet<_> = workers.into_iter().map(|worker| worker.join().unwrap()).collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(count_rows(&path, "resource_config_scopes"), 1);
}
