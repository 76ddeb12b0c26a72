//! Persistent leaderboard store: ranked, deduplicated scores kept in a device-local
//! key-value backend and guarded by an advisory lock, plus a loopback HTTP surface.

pub mod config;
/// Persistence: backends, codec and models.
pub mod dao;
/// Request and response payloads of the HTTP surface.
pub mod dto;
/// Store error taxonomy and its HTTP mapping.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Operations backing the HTTP routes and background tasks.
pub mod services;
pub mod state;
