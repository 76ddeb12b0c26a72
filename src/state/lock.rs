//! Advisory lock kept as a sentinel key next to the data it guards.
//!
//! `try_acquire` reads the sentinel and writes it when absent. The backend has
//! no compare-and-swap, so two callers interleaving between the read and the
//! write can both acquire. The lock carries no owner token and no lease: a
//! holder that dies leaves the sentinel behind until something releases it
//! (the leaderboard `clear` does).

use std::sync::Arc;

use tracing::warn;

use crate::dao::{kv_store::KvStore, storage::BackendResult};

/// Value written under the sentinel key while the lock is held.
pub const LOCK_SENTINEL: &str = "locked";

/// Cooperative mutual-exclusion marker over a [`KvStore`].
#[derive(Clone)]
pub struct AdvisoryLock {
    backend: Arc<dyn KvStore>,
    key: Arc<str>,
}

impl AdvisoryLock {
    /// Lock whose sentinel lives under `key` in `backend`.
    pub fn new(backend: Arc<dyn KvStore>, key: impl Into<Arc<str>>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Sentinel key this lock writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Take the lock if nobody holds it. Never waits.
    pub fn try_acquire(&self) -> BackendResult<bool> {
        if self.backend.get(&self.key)?.is_some() {
            return Ok(false);
        }
        self.backend.set(&self.key, LOCK_SENTINEL)?;
        Ok(true)
    }

    /// Remove the sentinel, whoever wrote it.
    pub fn release(&self) -> BackendResult<()> {
        self.backend.remove(&self.key)
    }

    /// Whether the sentinel is currently present.
    pub fn is_held(&self) -> BackendResult<bool> {
        Ok(self.backend.get(&self.key)?.is_some())
    }

    /// Acquire and wrap the lock in a guard releasing it on every exit path.
    pub fn try_guard(&self) -> BackendResult<Option<LockGuard<'_>>> {
        Ok(self.try_acquire()?.then(|| LockGuard {
            lock: self,
            released: false,
        }))
    }
}

/// Held advisory lock; released by [`LockGuard::release`] or on drop.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a> {
    lock: &'a AdvisoryLock,
    released: bool,
}

impl LockGuard<'_> {
    /// Release now and surface the backend outcome.
    pub fn release(mut self) -> BackendResult<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.lock.release() {
            warn!(key = %self.lock.key, error = %err, "failed to release advisory lock");
        }
    }
}
