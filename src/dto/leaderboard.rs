use serde::Serialize;
use utoipa::ToSchema;

/// One ranked row, decorated with the player's picture when known.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// 1-based position.
    pub rank: usize,
    /// Player name.
    pub name: String,
    /// Summed score, or the best single round for the daily ranking.
    pub score: u64,
    /// Round duration in seconds; daily rows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Stored picture as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Response listing the top of a ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked rows, best first.
    pub entries: Vec<LeaderboardRow>,
    /// Day of the daily ranking, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Position of one player in the global and daily rankings.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankResponse {
    /// Player name.
    pub name: String,
    /// 1-based position in the global ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_rank: Option<usize>,
    /// Summed score over every round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<u64>,
    /// 1-based position in today's daily ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_rank: Option<usize>,
}
