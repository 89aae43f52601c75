// crates/scopekeeper-core/src/core/time.rs
// ============================================================================
// Module: Scopekeeper Time Model
// Description: Timestamp representation for last-referenced bookkeeping.
// Purpose: Carry store-assigned times without binding the core to a clock.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core never reads wall-clock time. Stores stamp `last_referenced`
//! themselves and hand the value back as a [`Timestamp`]; the external
//! collector compares these values against its retention window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch milliseconds assigned by a store.
///
/// # Invariants
/// - No validation is performed; monotonicity across hosts is not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(value: i64) -> Self {
        Self(value)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
