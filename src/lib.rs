//! Library crate for hafalan-quiz-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Persistence layer: slot stores and persisted records.
pub mod dao;
mod dto;
mod error;
/// HTTP routes.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state and state machines.
pub mod state;
