use axum::{
    Json, Router,
    extract::State,
    routing::{post, put},
};
use axum_valid::Valid;

use crate::{
    dto::player::{EnterNameRequest, PlayerView, UpdatePictureRequest},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Routes identifying the player.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/player", post(enter_name))
        .route("/player/picture", put(update_picture))
}

/// Enter a name on the welcome screen and open the setup screen.
#[utoipa::path(
    post,
    path = "/player",
    tag = "player",
    request_body = EnterNameRequest,
    responses(
        (status = 200, description = "Player identified, stored picture restored", body = PlayerView),
        (status = 400, description = "Blank or overlong name"),
        (status = 409, description = "Not on the welcome screen")
    )
)]
pub async fn enter_name(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<EnterNameRequest>>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(player_service::enter_name(&state, &payload.name).await?))
}

/// Replace the current player's profile picture.
#[utoipa::path(
    put,
    path = "/player/picture",
    tag = "player",
    request_body = UpdatePictureRequest,
    responses(
        (status = 200, description = "Picture stored", body = PlayerView),
        (status = 400, description = "Not an image data URL or too large"),
        (status = 409, description = "No player entered yet")
    )
)]
pub async fn update_picture(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdatePictureRequest>>,
) -> Result<Json<PlayerView>, AppError> {
    Ok(Json(
        player_service::update_picture(&state, payload.profile_picture).await?,
    ))
}
