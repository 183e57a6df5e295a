use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::screen::{NavigationEvent, ScreenResponse, VisibleScreen},
    error::AppError,
    services::{navigation_service, public_service},
    state::SharedState,
};

/// Routes exposing and moving the current screen.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/screen", get(get_screen))
        .route("/navigation/{event}", post(navigate))
}

/// Current screen, player and global flags.
#[utoipa::path(
    get,
    path = "/screen",
    tag = "screen",
    responses((status = 200, description = "Current screen", body = ScreenResponse))
)]
pub async fn get_screen(State(state): State<SharedState>) -> Json<ScreenResponse> {
    Json(public_service::screen_overview(&state).await)
}

/// Move between screens without payload: `leaderboard`, `welcome` or `play-again`.
#[utoipa::path(
    post,
    path = "/navigation/{event}",
    tag = "screen",
    params(("event" = NavigationEvent, Path, description = "Screen move to apply")),
    responses(
        (status = 200, description = "Screen reached", body = VisibleScreen),
        (status = 409, description = "Move not allowed from the current screen")
    )
)]
pub async fn navigate(
    State(state): State<SharedState>,
    Path(event): Path<NavigationEvent>,
) -> Result<Json<VisibleScreen>, AppError> {
    Ok(Json(
        navigation_service::navigate(&state, event.into()).await?,
    ))
}
