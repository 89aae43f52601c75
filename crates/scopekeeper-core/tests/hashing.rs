// crates/scopekeeper-core/tests/hashing.rs
// ============================================================================
// Module: Source Hashing Tests
// Description: Tests for canonical source configuration hashing.
// ============================================================================
//! ## Overview
//! Validates that source hashes ignore construction order and track content.

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

use proptest::prelude::*;
use scopekeeper_core::Source;
use scopekeeper_core::hashing::hash_canonical_json;
use scopekeeper_core::hashing::source_hash;
use serde_json::Value;
use serde_json::json;

fn source(pairs: &[(&str, Value)]) -> Source {
    pairs.iter().map(|(key, value)| ((*key).to_string(), value.clone())).collect()
}

// ============================================================================
// SECTION: Stability
// ============================================================================

#[test]
fn source_hash_ignores_insertion_order() {
    let forward = source(&[("uri", json!("https://example.com/repo.git")), ("branch", json!("main"))]);
    let backward = source(&[("branch", json!("main")), ("uri", json!("https://example.com/repo.git"))]);

    assert_eq!(source_hash(&forward).unwrap(), source_hash(&backward).unwrap());
}

#[test]
fn source_hash_ignores_nested_key_order() {
    let a = source(&[("auth", json!({"user": "ci", "token": "t"}))]);
    let b = source(&[("auth", json!({"token": "t", "user": "ci"}))]);

    assert_eq!(source_hash(&a).unwrap(), source_hash(&b).unwrap());
}

#[test]
fn source_hash_is_lowercase_sha256_hex() {
    let hash = source_hash(&source(&[("uri", json!("x"))])).unwrap();

    assert_eq!(hash.as_str().len(), 64);
    assert!(hash.as_str().chars().all(|c| c.is_ascii_digit() || ('a' ..= 'f').contains(&c)));
}

#[test]
fn empty_source_hashes_like_empty_object() {
    let empty = source_hash(&Source::new()).unwrap();
    let object = hash_canonical_json(&json!({})).unwrap();

    assert_eq!(empty, object);
}

// ============================================================================
// SECTION: Sensitivity
// ============================================================================

#[test]
fn source_hash_changes_with_value() {
    let main = source(&[("branch", json!("main"))]);
    let dev = source(&[("branch", json!("dev"))]);

    assert_ne!(source_hash(&main).unwrap(), source_hash(&dev).unwrap());
}

#[test]
fn source_hash_distinguishes_value_types() {
    let number = source(&[("depth", json!(1))]);
    let string = source(&[("depth", json!("1"))]);
    let boolean = source(&[("depth", json!(true))]);

    let number = source_hash(&number).unwrap();
    let string = source_hash(&string).unwrap();
    let boolean = source_hash(&boolean).unwrap();
    assert_ne!(number, string);
    assert_ne!(number, boolean);
    assert_ne!(string, boolean);
}

#[test]
fn source_hash_distinguishes_null_from_missing() {
    let missing = source(&[("uri", json!("x"))]);
    let null = source(&[("uri", json!("x")), ("branch", Value::Null)]);

    assert_ne!(source_hash(&missing).unwrap(), source_hash(&null).unwrap());
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-z0-9/:._-]{0,24}".prop_map(Value::String),
    ]
}

proptest! {
    #[test]
    fn prop_hash_independent_of_construction_order(
        pairs in prop::collection::vec(("[a-z_]{1,12}", leaf_value()), 0 .. 12)
    ) {
        let forward: Source = pairs.iter().cloned().collect();
        // Later duplicates win in `collect`, so rebuild the reverse from the deduplicated map.
        let backward: Source = forward.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        prop_assert_eq!(source_hash(&forward).unwrap(), source_hash(&backward).unwrap());
    }

    #[test]
    fn prop_hash_changes_when_a_value_changes(
        pairs in prop::collection::vec(("[a-z_]{1,12}", "[a-z0-9]{0,16}"), 1 .. 8),
        suffix in "[a-z0-9]{1,4}",
    ) {
        let original: Source =
            pairs.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
        let mut changed = original.clone();
        if let Some((_, value)) = changed.iter_mut().next() {
            let text = value.as_str().unwrap_or_default().to_string();
            *value = Value::String(format!("{text}{suffix}"));
        }
        prop_assert_ne!(source_hash(&original).unwrap(), source_hash(&changed).unwrap());
    }

    #[test]
    fn prop_hash_is_deterministic(
        pairs in prop::collection::vec(("[a-z_]{1,12}", leaf_value()), 0 .. 12)
    ) {
        let source: Source = pairs.into_iter().collect();
        prop_assert_eq!(source_hash(&source).unwrap(), source_hash(&source.clone()).unwrap());
    }
}
