use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the storage backend answered its last probe.
    pub storage_available: bool,
}

impl HealthResponse {
    /// The backend is reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage_available: true,
        }
    }

    /// The backend failed its last probe; leaderboard routes answer 503.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            storage_available: false,
        }
    }
}
