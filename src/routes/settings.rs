use axum::{Json, Router, extract::State, routing::put};
use axum_valid::Valid;

use crate::{
    dto::settings::{ApiKeyRequest, ApiKeyResponse, MuteSetting},
    error::AppError,
    services::{player_service, round_service},
    state::SharedState,
};

/// Routes changing runtime settings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/settings/api-key", put(set_api_key))
        .route("/settings/mute", put(set_mute))
}

/// Replace the question source credential; a round that failed on the old one is retried.
#[utoipa::path(
    put,
    path = "/settings/api-key",
    tag = "settings",
    request_body = ApiKeyRequest,
    responses(
        (status = 200, description = "Credential replaced", body = ApiKeyResponse),
        (status = 400, description = "Empty credential")
    )
)]
pub async fn set_api_key(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ApiKeyRequest>>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let round = round_service::reauthorize(&state, payload.api_key).await?;
    Ok(Json(ApiKeyResponse { round }))
}

/// Store the sound preference.
#[utoipa::path(
    put,
    path = "/settings/mute",
    tag = "settings",
    request_body = MuteSetting,
    responses((status = 200, description = "Preference stored", body = MuteSetting))
)]
pub async fn set_mute(
    State(state): State<SharedState>,
    Json(payload): Json<MuteSetting>,
) -> Json<MuteSetting> {
    let muted = player_service::set_muted(&state, payload.muted).await;
    Json(MuteSetting { muted })
}
