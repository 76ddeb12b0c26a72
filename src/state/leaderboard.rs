//! Leaderboard store: ranked, deduplicated scores persisted in a [`KvStore`].
//!
//! Every write goes through the same protocol: take the advisory lock, read
//! and decode the stored board, merge the submitted entry with the
//! monotonic-max rule, re-rank, encode, write back, release. Failures never
//! reach the caller; they are handed to the [`ErrorReporter`] and the
//! operation answers with an empty board or `false`.

use std::sync::Arc;

use thiserror::Error;
use tokio::{task::JoinError, time::sleep};
use tracing::{debug, warn};
use validator::Validate;

use crate::{
    dao::{
        codec,
        kv_store::KvStore,
        models::{Leaderboard, LeaderboardEntry, MergeOutcome},
    },
    error::StoreError,
    state::{
        lock::AdvisoryLock,
        reporter::{ErrorReporter, TracingReporter},
        retry::{RetryPolicy, RetryScheduler},
    },
};

/// Key holding the encoded leaderboard.
pub const DEFAULT_DATA_KEY: &str = "leaderboard";
/// Key holding the advisory lock sentinel.
pub const DEFAULT_LOCK_KEY: &str = "leaderboard_lock";

/// Reserved backend keys: the encoded board and the lock sentinel.
///
/// The two keys always differ. A sentinel written over the data key would be
/// read back as a corrupt board and deleted along with it on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    data: String,
    lock: String,
}

/// Data and lock keys were given the same value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("data key and lock key must differ (both are `{0}`)")]
pub struct SharedKeyError(pub String);

impl StoreKeys {
    /// Pair a data key with a distinct lock key.
    pub fn new(data: impl Into<String>, lock: impl Into<String>) -> Result<Self, SharedKeyError> {
        let (data, lock) = (data.into(), lock.into());
        if data == lock {
            return Err(SharedKeyError(data));
        }
        Ok(Self { data, lock })
    }

    /// Key holding the encoded board.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Key holding the lock sentinel.
    pub fn lock(&self) -> &str {
        &self.lock
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            data: DEFAULT_DATA_KEY.into(),
            lock: DEFAULT_LOCK_KEY.into(),
        }
    }
}

/// Handle on the persisted leaderboard. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LeaderboardStore {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn KvStore>,
    data_key: String,
    lock: AdvisoryLock,
    reporter: Arc<dyn ErrorReporter>,
    scheduler: Arc<dyn RetryScheduler>,
    policy: RetryPolicy,
}

/// Builder for [`LeaderboardStore`].
pub struct LeaderboardStoreBuilder {
    backend: Arc<dyn KvStore>,
    scheduler: Arc<dyn RetryScheduler>,
    keys: StoreKeys,
    reporter: Arc<dyn ErrorReporter>,
    policy: RetryPolicy,
}

impl LeaderboardStoreBuilder {
    /// Use `keys` instead of [`DEFAULT_DATA_KEY`] and [`DEFAULT_LOCK_KEY`].
    pub fn keys(mut self, keys: StoreKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Hand swallowed failures to `reporter` instead of `tracing`.
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Override the delay and attempt bound for contended updates.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Finish the store.
    pub fn build(self) -> LeaderboardStore {
        let lock = AdvisoryLock::new(self.backend.clone(), self.keys.lock);
        LeaderboardStore {
            inner: Arc::new(Inner {
                backend: self.backend,
                data_key: self.keys.data,
                lock,
                reporter: self.reporter,
                scheduler: self.scheduler,
                policy: self.policy,
            }),
        }
    }
}

impl LeaderboardStore {
    /// Start building a store over `backend`, retrying contended updates on `scheduler`.
    pub fn builder(
        backend: Arc<dyn KvStore>,
        scheduler: Arc<dyn RetryScheduler>,
    ) -> LeaderboardStoreBuilder {
        LeaderboardStoreBuilder {
            backend,
            scheduler,
            keys: StoreKeys::default(),
            reporter: Arc::new(TracingReporter),
            policy: RetryPolicy::default(),
        }
    }

    /// Advisory lock guarding writes.
    pub fn lock(&self) -> &AdvisoryLock {
        &self.inner.lock
    }

    /// Retry bound applied to contended updates.
    pub fn policy(&self) -> RetryPolicy {
        self.inner.policy
    }

    /// Current ranked board; empty when nothing is stored or the read fails.
    pub fn get_all(&self) -> Leaderboard {
        self.try_get_all().unwrap_or_else(|err| {
            self.report(&err, "leaderboard.get_all");
            Leaderboard::default()
        })
    }

    /// Read and decode the stored board. Absent data is an empty board.
    pub fn try_get_all(&self) -> Result<Leaderboard, StoreError> {
        match self.inner.backend.get(&self.inner.data_key)? {
            Some(raw) => Ok(codec::decode(&raw)?),
            None => Ok(Leaderboard::default()),
        }
    }

    /// Merge `entry` into the board.
    ///
    /// Returns whether this attempt wrote the board. When another writer holds
    /// the lock the same update is rescheduled after the policy delay and
    /// `false` is returned right away; once the attempts run out the update is
    /// dropped.
    pub fn update(&self, entry: LeaderboardEntry) -> bool {
        self.attempt_update(entry, 1)
    }

    /// Run `op` against this store on tokio's blocking pool.
    ///
    /// The backend is synchronous and may touch the disk, so async callers go
    /// through here rather than calling the store from a runtime worker.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T, JoinError>
    where
        F: FnOnce(&LeaderboardStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store)).await
    }

    /// Merge `entry`, waiting out lock contention within the retry policy.
    /// Resolves to whether the board was eventually written.
    ///
    /// Each attempt runs on the blocking pool; only the waits between them
    /// happen on the runtime.
    pub async fn update_and_wait(&self, entry: LeaderboardEntry) -> bool {
        let policy = self.inner.policy;
        let mut attempt = 1;
        loop {
            let submitted = entry.clone();
            let result = match self
                .run_blocking(move |store| store.try_update(&submitted))
                .await
            {
                Ok(result) => result,
                Err(err) => {
                    warn!(name = %entry.name, error = %err, "leaderboard update task did not complete");
                    return false;
                }
            };

            match result {
                Ok(_) => return true,
                Err(StoreError::LockContended) if policy.allows_retry_after(attempt) => {
                    debug!(name = %entry.name, attempt, "leaderboard lock busy; waiting");
                    sleep(policy.delay).await;
                    attempt += 1;
                }
                Err(StoreError::LockContended) => {
                    warn!(name = %entry.name, attempts = attempt, "leaderboard lock still held; giving up");
                    return false;
                }
                Err(err) => {
                    self.report(&err, "leaderboard.update");
                    return false;
                }
            }
        }
    }

    /// One locked read-merge-write pass.
    ///
    /// The lock is released on every path once acquired, including failed
    /// writes; a failing release is reported but does not change the result.
    pub fn try_update(&self, entry: &LeaderboardEntry) -> Result<MergeOutcome, StoreError> {
        entry.validate().map_err(StoreError::InvalidEntry)?;

        let Some(guard) = self.inner.lock.try_guard()? else {
            return Err(StoreError::LockContended);
        };

        let result = self.merge_and_write(entry);

        if let Err(err) = guard.release() {
            self.report(&err.into(), "leaderboard.update.release_lock");
        }
        result
    }

    /// Remove the stored board and any lock sentinel left behind.
    ///
    /// Does not wait for the lock. Returns whether the board was removed.
    pub fn clear(&self) -> bool {
        match self.try_clear() {
            Ok(()) => true,
            Err(err) => {
                self.report(&err, "leaderboard.clear");
                false
            }
        }
    }

    /// Remove the stored board, surfacing the backend failure.
    ///
    /// A failing sentinel removal is reported, not returned.
    pub fn try_clear(&self) -> Result<(), StoreError> {
        self.inner.backend.remove(&self.inner.data_key)?;
        if let Err(err) = self.inner.lock.release() {
            self.report(&err.into(), "leaderboard.clear.release_lock");
        }
        Ok(())
    }

    fn attempt_update(&self, entry: LeaderboardEntry, attempt: u32) -> bool {
        match self.try_update(&entry) {
            Ok(_) => true,
            Err(StoreError::LockContended) => {
                self.schedule_retry(entry, attempt);
                false
            }
            Err(err) => {
                self.report(&err, "leaderboard.update");
                false
            }
        }
    }

    fn schedule_retry(&self, entry: LeaderboardEntry, attempt: u32) {
        let policy = self.inner.policy;
        if !policy.allows_retry_after(attempt) {
            warn!(name = %entry.name, attempts = attempt, "leaderboard lock still held; dropping update");
            return;
        }

        debug!(name = %entry.name, attempt, delay = ?policy.delay, "leaderboard lock busy; retry scheduled");
        let store = self.clone();
        self.inner.scheduler.schedule(
            policy.delay,
            Box::new(move || {
                store.attempt_update(entry, attempt + 1);
            }),
        );
    }

    fn merge_and_write(&self, entry: &LeaderboardEntry) -> Result<MergeOutcome, StoreError> {
        let mut board = self.try_get_all().unwrap_or_else(|err| {
            self.report(&err, "leaderboard.update.read");
            Leaderboard::default()
        });

        let outcome = board.merge(entry.clone());
        self.inner
            .backend
            .set(&self.inner.data_key, &codec::encode(&board))?;

        debug!(name = %entry.name, score = entry.score, ?outcome, "leaderboard updated");
        Ok(outcome)
    }

    fn report(&self, err: &StoreError, context: &str) {
        self.inner.reporter.report(err, context);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dao::kv_store::memory::MemoryKvStore,
        error::StoreErrorKind,
        state::{reporter::RecordingReporter, retry::ManualScheduler},
    };

    struct Harness {
        backend: Arc<MemoryKvStore>,
        scheduler: Arc<ManualScheduler>,
        reporter: Arc<RecordingReporter>,
        store: LeaderboardStore,
    }

    fn harness_with(backend: MemoryKvStore, policy: RetryPolicy) -> Harness {
        let backend = Arc::new(backend);
        let scheduler = Arc::new(ManualScheduler::new());
        let reporter = Arc::new(RecordingReporter::new());
        let store = LeaderboardStore::builder(backend.clone(), scheduler.clone())
            .reporter(reporter.clone())
            .policy(policy)
            .build();
        Harness {
            backend,
            scheduler,
            reporter,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryKvStore::new(), RetryPolicy::default())
    }

    fn ranked(store: &LeaderboardStore) -> Vec<(String, u64)> {
        store
            .get_all()
            .into_entries()
            .into_iter()
            .map(|entry| (entry.name, entry.score))
            .collect()
    }

    #[test]
    fn missing_board_reads_as_empty_without_reports() {
        let h = harness();
        assert!(h.store.get_all().is_empty());
        assert!(h.reporter.reports().is_empty());
    }

    #[test]
    fn lower_resubmission_keeps_the_best_score() {
        let h = harness();
        assert!(h.store.update(LeaderboardEntry::new("Ann", 10)));
        assert!(h.store.update(LeaderboardEntry::new("Bob", 20)));
        assert!(h.store.update(LeaderboardEntry::new("Ann", 5)));

        assert_eq!(
            ranked(&h.store),
            vec![("Bob".to_string(), 20), ("Ann".to_string(), 10)]
        );
    }

    #[test]
    fn lock_is_released_after_each_update() {
        let h = harness();
        assert!(h.store.update(LeaderboardEntry::new("Ann", 1)));
        assert!(!h.store.lock().is_held().unwrap());
    }

    #[test]
    fn contended_update_is_retried_after_release() {
        let h = harness();
        h.backend.set(DEFAULT_LOCK_KEY, "other tab").unwrap();

        assert!(!h.store.update(LeaderboardEntry::new("Cid", 1)));
        assert!(h.store.get_all().is_empty());
        assert_eq!(h.scheduler.pending_delays(), vec![RetryPolicy::DEFAULT_DELAY]);

        h.backend.remove(DEFAULT_LOCK_KEY).unwrap();
        assert_eq!(h.scheduler.run_pending(), 1);

        assert_eq!(ranked(&h.store), vec![("Cid".to_string(), 1)]);
        assert_eq!(h.scheduler.pending(), 0);
        assert!(h.reporter.reports().is_empty());
    }

    #[test]
    fn retries_stop_after_the_attempt_bound() {
        let h = harness_with(
            MemoryKvStore::new(),
            RetryPolicy::new(Duration::from_millis(50), 3),
        );
        h.backend.set(DEFAULT_LOCK_KEY, "stuck").unwrap();

        assert!(!h.store.update(LeaderboardEntry::new("Dee", 4)));
        assert_eq!(h.scheduler.run_until_idle(100), 2);

        assert_eq!(h.scheduler.pending(), 0);
        assert!(h.store.get_all().is_empty());
        assert_eq!(h.reporter.count(StoreErrorKind::LockContended), 0);
    }

    #[test]
    fn corrupt_board_reads_as_empty_and_is_reported_once() {
        let h = harness();
        h.backend.set(DEFAULT_DATA_KEY, "{not json").unwrap();

        assert!(h.store.get_all().is_empty());
        let reports = h.reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, StoreErrorKind::Decode);
        assert_eq!(reports[0].context, "leaderboard.get_all");
    }

    #[test]
    fn update_over_corrupt_board_starts_fresh() {
        let h = harness();
        h.backend.set(DEFAULT_DATA_KEY, "garbage").unwrap();

        assert!(h.store.update(LeaderboardEntry::new("Eve", 3)));
        assert_eq!(ranked(&h.store), vec![("Eve".to_string(), 3)]);
        assert_eq!(h.reporter.count(StoreErrorKind::Decode), 1);
    }

    #[test]
    fn quota_failure_leaves_board_and_lock_clean() {
        let h = harness_with(MemoryKvStore::new().with_quota(80), RetryPolicy::default());
        assert!(h.store.update(LeaderboardEntry::new("Ann", 1)));

        let long_name = "x".repeat(64);
        assert!(!h.store.update(LeaderboardEntry::new(long_name, 2)));

        assert_eq!(ranked(&h.store), vec![("Ann".to_string(), 1)]);
        assert!(!h.store.lock().is_held().unwrap());
        assert_eq!(h.reporter.count(StoreErrorKind::QuotaExceeded), 1);
    }

    #[test]
    fn disabled_backend_is_reported_not_raised() {
        let h = harness();
        h.backend.set_available(false);

        assert!(!h.store.update(LeaderboardEntry::new("Ann", 1)));
        assert!(h.store.get_all().is_empty());
        assert!(!h.store.clear());
        assert_eq!(h.reporter.count(StoreErrorKind::BackendUnavailable), 3);
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn empty_names_are_rejected_before_locking() {
        let h = harness();
        assert!(!h.store.update(LeaderboardEntry::new("", 9)));

        assert_eq!(h.reporter.count(StoreErrorKind::InvalidEntry), 1);
        assert!(h.backend.is_empty());
    }

    #[test]
    fn clear_empties_board_and_drops_stale_lock() {
        let h = harness();
        h.store.update(LeaderboardEntry::new("Ann", 10));
        h.backend.set(DEFAULT_LOCK_KEY, "crashed holder").unwrap();

        assert!(h.store.clear());
        assert!(h.store.get_all().is_empty());
        assert!(!h.store.lock().is_held().unwrap());
        assert!(h.store.update(LeaderboardEntry::new("Bob", 1)));
    }

    #[test]
    fn custom_keys_are_honoured() {
        let backend = Arc::new(MemoryKvStore::new());
        let store = LeaderboardStore::builder(backend.clone(), Arc::new(ManualScheduler::new()))
            .keys(StoreKeys::new("scores", "scores_lock").unwrap())
            .build();

        store.update(LeaderboardEntry::new("Ann", 1));
        assert_eq!(
            backend.get("scores").unwrap().as_deref(),
            Some(r#"[{"name":"Ann","score":1}]"#)
        );
        assert_eq!(backend.get(DEFAULT_DATA_KEY).unwrap(), None);
        assert_eq!(store.lock().key(), "scores_lock");
    }

    #[test]
    fn keys_sharing_one_name_are_refused() {
        assert_eq!(
            StoreKeys::new("lb", "lb"),
            Err(SharedKeyError("lb".into()))
        );
        let keys = StoreKeys::new("lb", "lb_lock").unwrap();
        assert_eq!((keys.data(), keys.lock()), ("lb", "lb_lock"));
        assert_ne!(StoreKeys::default().data(), StoreKeys::default().lock());
    }

    #[tokio::test(start_paused = true)]
    async fn update_and_wait_resolves_once_the_lock_frees() {
        let h = harness_with(
            MemoryKvStore::new(),
            RetryPolicy::new(Duration::from_millis(100), 10),
        );
        h.backend.set(DEFAULT_LOCK_KEY, "other tab").unwrap();

        let backend = h.backend.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(250)).await;
            backend.remove(DEFAULT_LOCK_KEY).unwrap();
        });

        assert!(h.store.update_and_wait(LeaderboardEntry::new("Fay", 7)).await);
        assert_eq!(ranked(&h.store), vec![("Fay".to_string(), 7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn update_and_wait_gives_up_on_a_stuck_lock() {
        let h = harness_with(
            MemoryKvStore::new(),
            RetryPolicy::new(Duration::from_millis(100), 4),
        );
        h.backend.set(DEFAULT_LOCK_KEY, "stuck").unwrap();

        let started = tokio::time::Instant::now();
        assert!(!h.store.update_and_wait(LeaderboardEntry::new("Gus", 1)).await);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
        assert!(h.reporter.reports().is_empty());
    }
}
