use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Hafalan Quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::stream,
        crate::routes::player::enter_name,
        crate::routes::player::update_picture,
        crate::routes::screen::get_screen,
        crate::routes::screen::navigate,
        crate::routes::setup::get_setup,
        crate::routes::round::start_round,
        crate::routes::round::current_round,
        crate::routes::round::select_option,
        crate::routes::round::submit_answer,
        crate::routes::round::next_question,
        crate::routes::round::retry_round,
        crate::routes::round::abandon_round,
        crate::routes::leaderboard::global,
        crate::routes::leaderboard::daily,
        crate::routes::leaderboard::rank,
        crate::routes::settings::set_api_key,
        crate::routes::settings::set_mute,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::ScreenChangedEvent,
            crate::dto::sse::RoundTickEvent,
            crate::dto::sse::RoundPointsEvent,
            crate::dto::sse::RoundFinishedEvent,
            crate::dto::sse::StoreChangedEvent,
            crate::dto::screen::NavigationEvent,
            crate::dto::round::StartRoundRequest,
            crate::dto::round::RoundView,
            crate::state::game::GameMode,
            crate::state::game::Difficulty,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "player", description = "Player identity and profile picture"),
        (name = "screen", description = "Current screen and payload-free navigation"),
        (name = "setup", description = "Setup screen data"),
        (name = "round", description = "Quiz round lifecycle"),
        (name = "leaderboard", description = "Global and daily rankings"),
        (name = "settings", description = "Question source credential and sound preference"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse",
            "/player",
            "/player/picture",
            "/screen",
            "/navigation/{event}",
            "/setup",
            "/round",
            "/round/select",
            "/round/submit",
            "/round/next",
            "/round/retry",
            "/leaderboard/global",
            "/leaderboard/daily",
            "/leaderboard/rank/{name}",
            "/settings/api-key",
            "/settings/mute",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
