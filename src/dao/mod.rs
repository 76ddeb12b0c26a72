/// Leaderboard text encoding and decoding.
pub mod codec;
/// Key-value backends the leaderboard is persisted to.
pub mod kv_store;
/// Leaderboard model definitions.
pub mod models;
/// Backend error types shared by every key-value store.
pub mod storage;
