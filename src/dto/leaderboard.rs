//! DTO definitions used by the leaderboard REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::{Leaderboard, LeaderboardEntry};
use crate::dto::validation::validate_player_name;

/// Score submitted at the end of a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitScoreRequest {
    /// Player name; exact, case-sensitive key of the leaderboard.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
    /// Non-negative score, higher is better.
    pub score: u64,
}

impl From<SubmitScoreRequest> for LeaderboardEntry {
    fn from(value: SubmitScoreRequest) -> Self {
        LeaderboardEntry::new(value.name, value.score)
    }
}

/// Optional paging of the ranked listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Only return the best `limit` entries.
    pub limit: Option<usize>,
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RankedEntry {
    /// 1-based position, best score first.
    pub rank: usize,
    /// Player name.
    pub name: String,
    /// Best score submitted for this player.
    pub score: u64,
}

impl From<(usize, &LeaderboardEntry)> for RankedEntry {
    fn from((rank, entry): (usize, &LeaderboardEntry)) -> Self {
        Self {
            rank,
            name: entry.name.clone(),
            score: entry.score,
        }
    }
}

/// Ranked leaderboard listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Total number of ranked players, regardless of `limit`.
    pub total: usize,
    /// Ranked rows, best first.
    pub entries: Vec<RankedEntry>,
}

impl LeaderboardResponse {
    /// Project the best `limit` entries (all of them when `None`).
    pub fn from_board(board: &Leaderboard, limit: Option<usize>) -> Self {
        let entries = board
            .entries()
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(index, entry)| RankedEntry::from((index + 1, entry)))
            .collect();
        Self {
            total: board.len(),
            entries,
        }
    }
}

/// Outcome of a score submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateResponse {
    /// Whether the leaderboard was written (a lower resubmission still counts).
    pub updated: bool,
}

/// Outcome of a leaderboard reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearResponse {
    /// Whether the stored board was removed.
    pub cleared: bool,
}
