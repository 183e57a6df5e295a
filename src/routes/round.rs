use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::round::{RoundView, SelectOptionRequest, StartRoundRequest},
    error::AppError,
    services::round_service,
    state::SharedState,
};

/// Routes driving the round on the playing screen.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/round",
            get(current_round).post(start_round).delete(abandon_round),
        )
        .route("/round/select", post(select_option))
        .route("/round/submit", post(submit_answer))
        .route("/round/next", post(next_question))
        .route("/round/retry", post(retry_round))
}

/// Start a round; questions load in the background.
#[utoipa::path(
    post,
    path = "/round",
    tag = "round",
    request_body = StartRoundRequest,
    responses(
        (status = 200, description = "Round created in the loading phase", body = RoundView),
        (status = 400, description = "Invalid configuration"),
        (status = 409, description = "Not on the setup screen, or daily challenge already completed today")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartRoundRequest>>,
) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::start_round(&state, payload).await?))
}

/// Current round as shown on the playing or finished screen.
#[utoipa::path(
    get,
    path = "/round",
    tag = "round",
    responses(
        (status = 200, description = "Current round", body = RoundView),
        (status = 404, description = "No round")
    )
)]
pub async fn current_round(State(state): State<SharedState>) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::current_round(&state).await?))
}

/// Pick an option for the current question; may be changed until submitted.
#[utoipa::path(
    post,
    path = "/round/select",
    tag = "round",
    request_body = SelectOptionRequest,
    responses(
        (status = 200, description = "Selection stored", body = RoundView),
        (status = 400, description = "Not an option of the current question"),
        (status = 409, description = "No question is awaiting an answer")
    )
)]
pub async fn select_option(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SelectOptionRequest>>,
) -> Result<Json<RoundView>, AppError> {
    Ok(Json(
        round_service::select_option(&state, payload.option).await?,
    ))
}

/// Submit the selected option and reveal the correct answer.
#[utoipa::path(
    post,
    path = "/round/submit",
    tag = "round",
    responses(
        (status = 200, description = "Answer resolved", body = RoundView),
        (status = 400, description = "Nothing selected"),
        (status = 409, description = "No question is awaiting an answer")
    )
)]
pub async fn submit_answer(State(state): State<SharedState>) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::submit_answer(&state).await?))
}

/// Move to the next question, or finish the round after the last one.
#[utoipa::path(
    post,
    path = "/round/next",
    tag = "round",
    responses(
        (status = 200, description = "Next question or final score", body = RoundView),
        (status = 409, description = "Current question not resolved")
    )
)]
pub async fn next_question(State(state): State<SharedState>) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::next_question(&state).await?))
}

/// Fetch the questions again after a failure.
#[utoipa::path(
    post,
    path = "/round/retry",
    tag = "round",
    responses(
        (status = 200, description = "Loading again", body = RoundView),
        (status = 409, description = "Round has not failed")
    )
)]
pub async fn retry_round(State(state): State<SharedState>) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::retry_round(&state).await?))
}

/// Abandon the round and go back to the setup screen. Nothing is recorded.
#[utoipa::path(
    delete,
    path = "/round",
    tag = "round",
    responses(
        (status = 204, description = "Round abandoned"),
        (status = 409, description = "Not on the playing screen")
    )
)]
pub async fn abandon_round(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    round_service::abandon_round(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}
