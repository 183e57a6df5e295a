use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::player::PlayerView, state::screen::{Screen, ScreenEvent}};

/// Screen exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleScreen {
    /// Name entry.
    Welcome,
    /// Round configuration and daily challenge preview.
    Setup,
    /// A round is loading or running.
    Playing,
    /// Result of the last round.
    Finished,
    /// Global and daily rankings.
    Leaderboard,
}

impl From<Screen> for VisibleScreen {
    fn from(value: Screen) -> Self {
        match value {
            Screen::Welcome => VisibleScreen::Welcome,
            Screen::Setup => VisibleScreen::Setup,
            Screen::Playing => VisibleScreen::Playing,
            Screen::Finished => VisibleScreen::Finished,
            Screen::Leaderboard => VisibleScreen::Leaderboard,
        }
    }
}

/// Response describing where the application currently is.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScreenResponse {
    /// Screen currently shown.
    pub screen: VisibleScreen,
    /// Player who entered a name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerView>,
    /// Sound preference.
    pub muted: bool,
    /// Whether the data directory is unreachable.
    pub degraded: bool,
}

/// Screen moves that carry no payload.
#[derive(Debug, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationEvent {
    /// Open the leaderboard from the welcome or finished screen.
    Leaderboard,
    /// Go back to the welcome screen.
    Welcome,
    /// Leave the finished screen for a new setup.
    PlayAgain,
}

impl From<NavigationEvent> for ScreenEvent {
    fn from(value: NavigationEvent) -> Self {
        match value {
            NavigationEvent::Leaderboard => ScreenEvent::ShowLeaderboard,
            NavigationEvent::Welcome => ScreenEvent::BackToWelcome,
            NavigationEvent::PlayAgain => ScreenEvent::PlayAgain,
        }
    }
}
