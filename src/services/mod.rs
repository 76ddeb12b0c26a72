/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard reads, score submissions and resets.
pub mod leaderboard_service;
/// Storage availability supervisor toggling degraded mode.
pub mod storage_supervisor;
