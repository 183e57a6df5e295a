/// Health check payloads.
pub mod health;
/// Leaderboard and rank payloads.
pub mod leaderboard;
/// Player identity payloads.
pub mod player;
/// Round requests and views.
pub mod round;
/// Screen and navigation payloads.
pub mod screen;
/// Credential and sound settings payloads.
pub mod settings;
/// Setup screen payload.
pub mod setup;
/// Server-Sent Events payloads.
pub mod sse;
/// Request validation helpers.
pub mod validation;
