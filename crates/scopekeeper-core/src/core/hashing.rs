// crates/scopekeeper-core/src/core/hashing.rs
// ============================================================================
// Module: Scopekeeper Content Hashing
// Description: RFC 8785 JSON canonicalization and source hashing utilities.
// Purpose: Provide stable digests used as resource config dedup keys.
// Dependencies: serde, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Source configuration maps are hashed over their RFC 8785 (JCS) canonical
//! JSON form, so key order never affects the digest while value types do
//! (`1` and `"1"` canonicalize differently). SHA-256 is unseeded, which keeps
//! digests stable across process restarts. Digests are opaque dedup keys and
//! are never parsed back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Source Configuration
// ============================================================================

/// Source configuration of a resource, keyed by field name.
pub type Source = BTreeMap<String, Value>;

// ============================================================================
// SECTION: Source Hash
// ============================================================================

/// Lowercase hex SHA-256 digest of canonical JSON.
///
/// # Invariants
/// - Always 64 lowercase hex characters when produced by [`hash_canonical_json`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceHash(String);

impl SourceHash {
    /// Wraps a digest previously read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of any serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<SourceHash, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hashes a source configuration map.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when a value cannot be canonicalized
/// (for example a non-finite float smuggled in through a custom value).
pub fn source_hash(source: &Source) -> Result<SourceHash, HashError> {
    hash_canonical_json(source)
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> SourceHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    SourceHash(hex_encode(&hasher.finalize()))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
