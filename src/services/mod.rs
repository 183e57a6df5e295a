/// Daily challenge configuration derived from the calendar day.
pub mod daily;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Global and daily ranking computations.
pub mod leaderboard;
/// Payload-free screen moves.
pub mod navigation_service;
/// Player identity, profile picture and sound preference.
pub mod player_service;
/// Read-only projections for leaderboards, setup and screen.
pub mod public_service;
/// Question batch providers.
pub mod question_source;
/// Round lifecycle: loading, countdown, answers and scoring.
pub mod round_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Data directory supervisor toggling degraded mode.
pub mod storage_supervisor;
