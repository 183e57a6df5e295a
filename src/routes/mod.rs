use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Global and daily rankings.
pub mod leaderboard;
/// Name entry and profile picture.
pub mod player;
/// Round lifecycle.
pub mod round;
/// Current screen and navigation.
pub mod screen;
/// Credential and sound settings.
pub mod settings;
/// Setup screen data.
pub mod setup;
/// Event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(player::router())
        .merge(screen::router())
        .merge(setup::router())
        .merge(round::router())
        .merge(leaderboard::router())
        .merge(settings::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
