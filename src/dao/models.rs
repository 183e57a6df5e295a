use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::state::game::{Difficulty, GameMode};

/// One completed round, as stored in the score history.
///
/// Field names follow the JSON layout written by earlier releases so existing
/// histories load unchanged.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    /// Player name.
    pub name: String,
    /// Points earned, a multiple of the per-answer award.
    pub score: u32,
    /// RFC 3339 timestamp of the end of the round (device-local offset).
    pub date: String,
    /// Juz the round was drawn from.
    pub juz: Vec<u8>,
    /// Difficulty of the round.
    pub difficulty: Difficulty,
    /// Number of questions requested.
    pub number_of_questions: u32,
    /// Mode of the round.
    pub game_mode: GameMode,
    /// Elapsed whole seconds, absent when unmeasured.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Versioned envelope persisted in the scores slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScores {
    /// Schema version of `data`.
    pub version: u32,
    /// Append-only history, oldest first.
    pub data: Vec<ScoreRecord>,
}

/// Per-player profile entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEntity {
    /// Downscaled, re-encoded picture (data URL).
    pub profile_picture: String,
}

/// Player name to profile, last write wins per name.
pub type PlayerProfiles = IndexMap<String, ProfileEntity>;

/// Player name to the `YYYY-MM-DD` date of their last finished daily challenge.
pub type DailyCompletions = IndexMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_record_uses_legacy_field_names() {
        let record = ScoreRecord {
            name: "Ali".into(),
            score: 40,
            date: "2026-10-19T08:00:00+07:00".into(),
            juz: vec![30],
            difficulty: Difficulty::Easy,
            number_of_questions: 5,
            game_mode: GameMode::MultipleChoice,
            duration: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["numberOfQuestions"], 5);
        assert_eq!(json["gameMode"], "Pilihan Ganda");
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn missing_duration_deserializes_as_none() {
        let raw = r#"{"name":"Ali","score":20,"date":"2025-01-01T00:00:00.000Z","juz":[1],
            "difficulty":"Sedang","numberOfQuestions":10,"gameMode":"Tantangan Harian"}"#;
        let record: ScoreRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.duration, None);
        assert_eq!(record.game_mode, GameMode::DailyChallenge);
    }
}
