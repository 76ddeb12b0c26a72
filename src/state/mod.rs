//! Shared application state and the leaderboard store protocol.

/// Leaderboard store handle and its builder.
pub mod leaderboard;
/// Advisory lock over a sentinel key.
pub mod lock;
/// Collaborators receiving swallowed failures.
pub mod reporter;
/// Retry bound and schedulers for contended updates.
pub mod retry;

use std::sync::Arc;

use tokio::sync::watch;

use crate::{dao::kv_store::KvStore, error::ServiceError};

pub use self::leaderboard::{LeaderboardStore, StoreKeys};

/// Handle on [`AppState`] shared across handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Central application state shared by the HTTP handlers and the storage supervisor.
pub struct AppState {
    leaderboard: LeaderboardStore,
    backend: Arc<dyn KvStore>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The backend is assumed healthy until the supervisor observes otherwise.
    pub fn new(leaderboard: LeaderboardStore, backend: Arc<dyn KvStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            leaderboard,
            backend,
            degraded: degraded_tx,
        })
    }

    /// Leaderboard store handle.
    pub fn leaderboard(&self) -> &LeaderboardStore {
        &self.leaderboard
    }

    /// Backend the leaderboard persists to.
    pub fn backend(&self) -> &Arc<dyn KvStore> {
        &self.backend
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Fail fast with [`ServiceError::Degraded`] while storage is known to be down.
    pub fn require_storage(&self) -> Result<(), ServiceError> {
        if self.is_degraded() {
            Err(ServiceError::Degraded)
        } else {
            Ok(())
        }
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
