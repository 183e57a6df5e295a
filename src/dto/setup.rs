use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{leaderboard::LeaderboardRow, player::PlayerView},
    state::game::{Difficulty, GameMode},
};

/// Configuration of today's daily challenge and whether the player already finished it.
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyChallengePreview {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Question style of the day.
    pub mode: GameMode,
    /// Juz of the daily challenge.
    pub juz: Vec<u8>,
    /// Difficulty of the daily challenge.
    pub difficulty: Difficulty,
    /// Questions in the daily challenge.
    pub question_count: u32,
    /// Whether the current player already finished it today.
    pub completed: bool,
}

/// Everything the setup screen shows next to the configuration form.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetupResponse {
    /// Player who entered a name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerView>,
    /// Today's daily challenge.
    pub daily: DailyChallengePreview,
    /// Top of the global ranking.
    pub top_players: Vec<LeaderboardRow>,
    /// Motivational quote shown on the setup screen.
    pub quote: String,
    /// Sound preference.
    pub muted: bool,
}
