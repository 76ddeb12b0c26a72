use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// `/healthcheck`.
pub mod health;
/// `/leaderboard` endpoints.
pub mod leaderboard;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(leaderboard::router())
        .merge(docs::router())
        .with_state(state)
}
