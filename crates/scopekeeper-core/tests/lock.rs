// crates/scopekeeper-core/tests/lock.rs
// ============================================================================
// Module: In-Memory Lock Tests
// Description: Tests for the process-local lock gate.
// ============================================================================
//! ## Overview
//! Validates exclusivity and release semantics of [`InMemoryLockFactory`].

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use scopekeeper_core::InMemoryLockFactory;
use scopekeeper_core::LockFactory;
use scopekeeper_core::LockId;
use scopekeeper_core::ResourceConfigScopeId;
use scopekeeper_core::SharedLockFactory;

fn scope_lock(raw: u64) -> LockId {
    LockId::ResourceScopeChecking(ResourceConfigScopeId::from_raw(raw).unwrap())
}

#[test]
fn second_acquire_is_refused_while_held() {
    let factory = InMemoryLockFactory::new();
    let held = factory.acquire(scope_lock(1)).unwrap();

    assert!(held.is_some());
    assert!(factory.acquire(scope_lock(1)).unwrap().is_none());
    assert!(factory.is_held(scope_lock(1)).unwrap());
}

#[test]
fn distinct_ids_do_not_contend() {
    let factory = InMemoryLockFactory::new();
    let _first = factory.acquire(scope_lock(1)).unwrap().unwrap();

    assert!(factory.acquire(scope_lock(2)).unwrap().is_some());
}

#[test]
fn release_makes_lock_available_again() {
    let factory = InMemoryLockFactory::new();
    let lock = factory.acquire(scope_lock(3)).unwrap().unwrap();
    assert_eq!(lock.id(), scope_lock(3));

    lock.release().unwrap();

    assert!(!factory.is_held(scope_lock(3)).unwrap());
    assert!(factory.acquire(scope_lock(3)).unwrap().is_some());
}

#[test]
fn dropping_lock_releases_it() {
    let factory = InMemoryLockFactory::new();
    {
        let _lock = factory.acquire(scope_lock(4)).unwrap().unwrap();
        assert!(factory.is_held(scope_lock(4)).unwrap());
    }

    assert!(!factory.is_held(scope_lock(4)).unwrap());
}

#[test]
fn shared_factory_clones_see_the_same_locks() {
    let inner = InMemoryLockFactory::new();
    let shared = SharedLockFactory::from_factory(inner.clone());
    let other = shared.clone();
    let _lock = shared.acquire(scope_lock(5)).unwrap().unwrap();

    assert!(other.acquire(scope_lock(5)).unwrap().is_none());
    assert!(inner.is_held(scope_lock(5)).unwrap());
}

#[test]
fn lock_id_display_names_the_scope() {
    assert_eq!(scope_lock(12).to_string(), "resource-scope-checking:12");
}
