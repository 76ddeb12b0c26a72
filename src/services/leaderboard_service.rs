//! Service helpers exposing the leaderboard store to the HTTP layer.
//!
//! The store talks to a synchronous backend, so every call is handed to the
//! blocking pool through [`LeaderboardStore::run_blocking`].

use tracing::info;

use crate::{
    dao::models::Leaderboard,
    dto::leaderboard::{
        ClearResponse, LeaderboardResponse, RankedEntry, SubmitScoreRequest, UpdateResponse,
    },
    error::ServiceError,
    state::{LeaderboardStore, SharedState},
};

/// Return the ranked leaderboard, optionally truncated to the best `limit` rows.
pub async fn list_entries(
    state: &SharedState,
    limit: Option<usize>,
) -> Result<LeaderboardResponse, ServiceError> {
    if limit == Some(0) {
        return Err(ServiceError::InvalidInput("limit must be at least 1".into()));
    }

    let board = read_board(state).await?;
    Ok(LeaderboardResponse::from_board(&board, limit))
}

/// Return the rank and best score of a single player.
pub async fn find_entry(state: &SharedState, name: &str) -> Result<RankedEntry, ServiceError> {
    let board = read_board(state).await?;
    board
        .rank_of(name)
        .map(RankedEntry::from)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{name}` is not ranked")))
}

/// Merge a submitted score, waiting out lock contention within the retry policy.
///
/// Callers must validate the request first.
pub async fn submit_score(
    state: &SharedState,
    request: SubmitScoreRequest,
) -> Result<UpdateResponse, ServiceError> {
    state.require_storage()?;
    let updated = state
        .leaderboard()
        .update_and_wait(request.into())
        .await;
    Ok(UpdateResponse { updated })
}

/// Reset the leaderboard.
pub async fn clear(state: &SharedState) -> Result<ClearResponse, ServiceError> {
    state.require_storage()?;
    let cleared = state
        .leaderboard()
        .run_blocking(LeaderboardStore::clear)
        .await?;
    if cleared {
        info!("leaderboard cleared");
    }
    Ok(ClearResponse { cleared })
}

async fn read_board(state: &SharedState) -> Result<Leaderboard, ServiceError> {
    state.require_storage()?;
    Ok(state
        .leaderboard()
        .run_blocking(LeaderboardStore::get_all)
        .await?)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex, PoisonError},
        thread::{self, ThreadId},
    };

    use super::*;
    use crate::{
        dao::{
            kv_store::{KvStore, memory::MemoryKvStore},
            storage::BackendResult,
        },
        state::{AppState, retry::ManualScheduler},
    };

    /// Backend remembering which threads called it.
    #[derive(Default)]
    struct ThreadTrackingKvStore {
        inner: MemoryKvStore,
        callers: Mutex<Vec<ThreadId>>,
    }

    impl ThreadTrackingKvStore {
        fn track(&self) {
            self.callers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(thread::current().id());
        }

        fn callers(&self) -> Vec<ThreadId> {
            self.callers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl KvStore for ThreadTrackingKvStore {
        fn get(&self, key: &str) -> BackendResult<Option<String>> {
            self.track();
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> BackendResult<()> {
            self.track();
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> BackendResult<()> {
            self.track();
            self.inner.remove(key)
        }

        fn health_check(&self) -> BackendResult<()> {
            self.track();
            self.inner.health_check()
        }
    }

    fn state_over(backend: Arc<dyn KvStore>) -> SharedState {
        let store =
            LeaderboardStore::builder(backend.clone(), Arc::new(ManualScheduler::new())).build();
        AppState::new(store, backend)
    }

    fn state() -> SharedState {
        state_over(Arc::new(MemoryKvStore::new()))
    }

    fn submit(name: &str, score: u64) -> SubmitScoreRequest {
        SubmitScoreRequest {
            name: name.into(),
            score,
        }
    }

    #[tokio::test]
    async fn submitted_scores_are_listed_by_rank() {
        let state = state();
        assert!(submit_score(&state, submit("Ann", 10)).await.unwrap().updated);
        assert!(submit_score(&state, submit("Bob", 20)).await.unwrap().updated);
        assert!(submit_score(&state, submit("Cid", 15)).await.unwrap().updated);

        let listing = list_entries(&state, Some(2)).await.unwrap();
        assert_eq!(listing.total, 3);
        assert_eq!(
            listing.entries,
            vec![
                RankedEntry {
                    rank: 1,
                    name: "Bob".into(),
                    score: 20
                },
                RankedEntry {
                    rank: 2,
                    name: "Cid".into(),
                    score: 15
                },
            ]
        );
    }

    #[tokio::test]
    async fn find_entry_reports_rank_or_not_found() {
        let state = state();
        submit_score(&state, submit("Ann", 10)).await.unwrap();
        submit_score(&state, submit("Bob", 20)).await.unwrap();

        let ann = find_entry(&state, "Ann").await.unwrap();
        assert_eq!((ann.rank, ann.score), (2, 10));
        assert!(matches!(
            find_entry(&state, "ann").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn zero_limit_is_rejected() {
        assert!(matches!(
            list_entries(&state(), Some(0)).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn clear_resets_listing() {
        let state = state();
        submit_score(&state, submit("Ann", 10)).await.unwrap();

        assert!(clear(&state).await.unwrap().cleared);
        assert_eq!(list_entries(&state, None).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn degraded_mode_refuses_storage_operations() {
        let state = state();
        submit_score(&state, submit("Ann", 10)).await.unwrap();
        state.update_degraded(true);

        assert!(matches!(
            list_entries(&state, None).await,
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(
            find_entry(&state, "Ann").await,
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(
            submit_score(&state, submit("Bob", 20)).await,
            Err(ServiceError::Degraded)
        ));
        assert!(matches!(clear(&state).await, Err(ServiceError::Degraded)));

        state.update_degraded(false);
        assert_eq!(list_entries(&state, None).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn backend_calls_stay_off_the_runtime_thread() {
        let backend = Arc::new(ThreadTrackingKvStore::default());
        let state = state_over(backend.clone());

        submit_score(&state, submit("Ann", 10)).await.unwrap();
        list_entries(&state, None).await.unwrap();
        find_entry(&state, "Ann").await.unwrap();
        clear(&state).await.unwrap();

        let runtime_thread = thread::current().id();
        let callers = backend.callers();
        assert!(!callers.is_empty());
        assert!(callers.iter().all(|caller| *caller != runtime_thread));
    }
}
