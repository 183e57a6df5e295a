use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::leaderboard::{LeaderboardResponse, RankResponse},
    services::public_service,
    state::SharedState,
};

/// Ranking routes, recomputed from the score history on every call.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard/global", get(global))
        .route("/leaderboard/daily", get(daily))
        .route("/leaderboard/rank/{name}", get(rank))
}

/// Top 50 players by summed score.
#[utoipa::path(
    get,
    path = "/leaderboard/global",
    tag = "leaderboard",
    responses((status = 200, description = "Global ranking", body = LeaderboardResponse))
)]
pub async fn global(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(public_service::global_leaderboard(&state).await)
}

/// Top 50 daily-challenge rounds of today, by score then duration.
#[utoipa::path(
    get,
    path = "/leaderboard/daily",
    tag = "leaderboard",
    responses((status = 200, description = "Daily ranking", body = LeaderboardResponse))
)]
pub async fn daily(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(public_service::daily_leaderboard(&state).await)
}

/// Position of one player in both rankings.
#[utoipa::path(
    get,
    path = "/leaderboard/rank/{name}",
    tag = "leaderboard",
    params(("name" = String, Path, description = "Player name")),
    responses((status = 200, description = "Player position", body = RankResponse))
)]
pub async fn rank(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<RankResponse> {
    Json(public_service::player_rank(&state, &name).await)
}
