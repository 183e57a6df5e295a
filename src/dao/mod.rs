/// Persisted record definitions.
pub mod models;
/// Versioned score-history codec.
pub mod score_history;
/// Slot store abstraction and its backends.
pub mod slot_store;
/// Storage error types shared by every backend.
pub mod storage;
