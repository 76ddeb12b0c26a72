use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use validator::Validate;

use crate::{
    dto::leaderboard::{
        ClearResponse, LeaderboardQuery, LeaderboardResponse, RankedEntry, SubmitScoreRequest,
        UpdateResponse,
    },
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Leaderboard endpoints for the game UI running on this device.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/leaderboard",
            get(list_leaderboard)
                .post(submit_score)
                .delete(clear_leaderboard),
        )
        .route("/leaderboard/{name}", get(get_player))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked scores, best first", body = LeaderboardResponse),
        (status = 400, description = "Invalid limit"),
        (status = 503, description = "Storage is in degraded mode")
    )
)]
/// Return the ranked leaderboard. Unreadable stored data yields an empty listing.
pub async fn list_leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(
        leaderboard_service::list_entries(&state, query.limit).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/leaderboard",
    tag = "leaderboard",
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Whether the score was merged into the leaderboard", body = UpdateResponse),
        (status = 400, description = "Invalid player name"),
        (status = 503, description = "Storage is in degraded mode")
    )
)]
/// Submit a score. A lower score than the stored one leaves the leaderboard unchanged.
pub async fn submit_score(
    State(state): State<SharedState>,
    Json(request): Json<SubmitScoreRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    request.validate()?;
    Ok(Json(
        leaderboard_service::submit_score(&state, request).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Whether the leaderboard was removed", body = ClearResponse),
        (status = 503, description = "Storage is in degraded mode")
    )
)]
/// Reset the leaderboard and drop any stale lock.
pub async fn clear_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<ClearResponse>, AppError> {
    Ok(Json(leaderboard_service::clear(&state).await?))
}

#[utoipa::path(
    get,
    path = "/leaderboard/{name}",
    tag = "leaderboard",
    params(("name" = String, Path, description = "Exact, case-sensitive player name")),
    responses(
        (status = 200, description = "Rank and best score of the player", body = RankedEntry),
        (status = 404, description = "Player is not ranked"),
        (status = 503, description = "Storage is in degraded mode")
    )
)]
/// Return the rank and best score of one player.
pub async fn get_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<RankedEntry>, AppError> {
    Ok(Json(leaderboard_service::find_entry(&state, &name).await?))
}
