//! In-memory [`KvStore`] used for tests and as a fallback when no durable medium is configured.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::dao::{
    kv_store::{KvStore, entry_cost},
    storage::{BackendError, BackendResult},
};

/// Volatile key-value store with an optional byte quota and an availability switch.
#[derive(Debug)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
    quota: Option<usize>,
    available: AtomicBool,
}

impl MemoryKvStore {
    /// Create an empty, available store without quota.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            quota: None,
            available: AtomicBool::new(true),
        }
    }

    /// Limit the total number of bytes (keys plus values) the store accepts.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Simulate storage being disabled (`false`) or re-enabled (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::disabled())
        }
    }

    /// Bytes used by every entry except `key`.
    fn usage_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry_cost(entry.key(), entry.value()))
            .sum()
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.ensure_available()?;
        if let Some(limit) = self.quota {
            let needed = self.usage_without(key) + entry_cost(key, value);
            if needed > limit {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        self.ensure_available()?;
        self.entries.remove(key);
        Ok(())
    }

    fn health_check(&self) -> BackendResult<()> {
        self.ensure_available()
    }
}
