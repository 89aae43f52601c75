// crates/scopekeeper-core/src/runtime/lock.rs
// ============================================================================
// Module: Scopekeeper In-Memory Locks
// Description: Process-local lock factory.
// Purpose: Provide a non-blocking lock gate without an external lock service.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryLockFactory`] tracks held lock ids in a shared set. Locks are
//! try-acquire only and release on [`Lock::release`] or on drop. Only callers
//! sharing the same factory instance are serialized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use crate::interfaces::Lock;
use crate::interfaces::LockError;
use crate::interfaces::LockFactory;
use crate::interfaces::LockId;

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Held lock ids shared between a factory and its locks.
type HeldLocks = Arc<Mutex<BTreeSet<LockId>>>;

/// Process-local lock factory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLockFactory {
    /// Currently held lock ids.
    held: HeldLocks,
}

impl InMemoryLockFactory {
    /// Creates an empty lock factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `id` is currently held.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Backend`] when the lock table mutex is poisoned.
    pub fn is_held(&self, id: LockId) -> Result<bool, LockError> {
        let guard =
            self.held.lock().map_err(|_| LockError::Backend("lock table poisoned".to_string()))?;
        Ok(guard.contains(&id))
    }
}

impl LockFactory for InMemoryLockFactory {
    fn acquire(&self, id: LockId) -> Result<Option<Box<dyn Lock>>, LockError> {
        let mut guard =
            self.held.lock().map_err(|_| LockError::Backend("lock table poisoned".to_string()))?;
        if !guard.insert(id) {
            return Ok(None);
        }
        drop(guard);
        Ok(Some(Box::new(InMemoryLock {
            id,
            held: Some(Arc::clone(&self.held)),
        })))
    }
}

// ============================================================================
// SECTION: Lock
// ============================================================================

/// Lock handed out by [`InMemoryLockFactory`].
struct InMemoryLock {
    /// Lock identity.
    id: LockId,
    /// Lock table; `None` once released.
    held: Option<HeldLocks>,
}

impl InMemoryLock {
    /// Removes the id from the lock table once.
    fn unlock(&mut self) -> Result<(), LockError> {
        let Some(held) = self.held.take() else {
            return Ok(());
        };
        held.lock()
            .map_err(|_| LockError::Backend("lock table poisoned".to_string()))?
            .remove(&self.id);
        Ok(())
    }
}

impl Lock for InMemoryLock {
    fn id(&self) -> LockId {
        self.id
    }

    fn release(mut self: Box<Self>) -> Result<(), LockError> {
        self.unlock()
    }
}

impl Drop for InMemoryLock {
    fn drop(&mut self) {
        let _ = self.unlock();
    }
}
