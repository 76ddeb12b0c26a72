use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the leaderboard store.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::leaderboard::list_leaderboard,
        crate::routes::leaderboard::submit_score,
        crate::routes::leaderboard::clear_leaderboard,
        crate::routes::leaderboard::get_player,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::leaderboard::SubmitScoreRequest,
            crate::dto::leaderboard::RankedEntry,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::leaderboard::UpdateResponse,
            crate::dto::leaderboard::ClearResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "leaderboard", description = "Ranked scores persisted on this device"),
    )
)]
/// OpenAPI document of the leaderboard API.
pub struct ApiDoc;
