/// Health check payloads.
pub mod health;
pub mod leaderboard;
pub mod validation;
