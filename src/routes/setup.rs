use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::setup::SetupResponse, services::public_service, state::SharedState};

/// Routes feeding the setup screen.
pub fn router() -> Router<SharedState> {
    Router::new().route("/setup", get(get_setup))
}

/// Daily challenge preview, top players, quote and sound preference.
#[utoipa::path(
    get,
    path = "/setup",
    tag = "setup",
    responses((status = 200, description = "Setup screen data", body = SetupResponse))
)]
pub async fn get_setup(State(state): State<SharedState>) -> Json<SetupResponse> {
    Json(public_service::setup_overview(&state).await)
}
