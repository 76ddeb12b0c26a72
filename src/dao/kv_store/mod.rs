/// Directory backend storing one file per key.
#[cfg(feature = "file-store")]
pub mod file;
pub mod memory;

use crate::dao::storage::BackendResult;

/// Synchronous string-keyed, string-valued durable store scoped to one device.
///
/// Mirrors the browser `localStorage` contract: every call completes before it
/// returns, there is no compare-and-swap, and writes may be rejected once the
/// capacity is used up.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> BackendResult<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> BackendResult<()>;
    /// Delete `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> BackendResult<()>;
    /// Check that the backend is reachable and accepting operations.
    fn health_check(&self) -> BackendResult<()>;
}

/// Bytes accounted against a quota for one stored pair, like browsers do.
pub(crate) fn entry_cost(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
