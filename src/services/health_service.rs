use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the degraded flag maintained by the storage supervisor.
///
/// Never touches the backend itself; the supervisor's probe is the single
/// source of truth.
pub fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::kv_store::memory::MemoryKvStore,
        state::{AppState, LeaderboardStore, retry::ManualScheduler},
    };

    #[test]
    fn status_follows_the_degraded_flag() {
        let backend = Arc::new(MemoryKvStore::new());
        let store =
            LeaderboardStore::builder(backend.clone(), Arc::new(ManualScheduler::new())).build();
        let state = AppState::new(store, backend.clone());

        // The flag, not a fresh probe, decides the answer.
        backend.set_available(false);
        assert!(health_status(&state).storage_available);

        state.update_degraded(true);
        let health = health_status(&state);
        assert_eq!(health.status, "degraded");
        assert!(!health.storage_available);
    }
}
