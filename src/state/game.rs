use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use utoipa::ToSchema;

use crate::services::daily::daily_mode_for;

/// Number of Juz in the Quran; valid Juz numbers are `1..=JUZ_COUNT`.
pub const JUZ_COUNT: u8 = 30;
/// Every quiz question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Difficulty level requested from the question source.
///
/// Serialized with the Indonesian labels used by the persisted score history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    /// "Mudah".
    #[serde(rename = "Mudah")]
    Easy,
    /// "Sedang".
    #[serde(rename = "Sedang")]
    Medium,
    /// "Susah".
    #[serde(rename = "Susah")]
    Hard,
}

impl Difficulty {
    /// Label shown to players and embedded in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Mudah",
            Difficulty::Medium => "Sedang",
            Difficulty::Hard => "Susah",
        }
    }
}

/// Game mode selected on the setup screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GameMode {
    /// Continue the verse ("Pilihan Ganda").
    #[serde(rename = "Pilihan Ganda")]
    MultipleChoice,
    /// Guess which Surah a verse belongs to ("Tebak Surah").
    #[serde(rename = "Tebak Surah")]
    GuessSurah,
    /// Fill the missing word(s) of a verse ("Isi Ayat").
    #[serde(rename = "Isi Ayat")]
    FillBlank,
    /// One shared round per calendar day ("Tantangan Harian").
    #[serde(rename = "Tantangan Harian")]
    DailyChallenge,
}

impl GameMode {
    /// Label shown to players and stored in score records.
    pub fn label(self) -> &'static str {
        match self {
            GameMode::MultipleChoice => "Pilihan Ganda",
            GameMode::GuessSurah => "Tebak Surah",
            GameMode::FillBlank => "Isi Ayat",
            GameMode::DailyChallenge => "Tantangan Harian",
        }
    }

    /// Whether this mode is the once-per-day challenge.
    pub fn is_daily(self) -> bool {
        matches!(self, GameMode::DailyChallenge)
    }
}

/// A single multiple-choice quiz item produced by the question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Prompt shown to the player.
    pub question_text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// The correct option, matched by exact string equality.
    pub correct_answer: String,
    /// Human readable source reference, e.g. `Al-Baqarah: 255`.
    pub reference: String,
}

impl Question {
    /// A question is usable only with four options, one of which is the correct answer.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION && self.options.contains(&self.correct_answer)
    }
}

/// Reasons a round configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundConfigError {
    /// No Juz was selected.
    #[error("at least one juz must be selected")]
    EmptyJuz,
    /// A Juz number outside `1..=30`.
    #[error("juz {0} is out of range (1..={JUZ_COUNT})")]
    JuzOutOfRange(u8),
    /// Zero questions requested.
    #[error("question count must be strictly positive")]
    ZeroQuestions,
    /// Daily challenge requested without a date seed.
    #[error("daily challenge requires a date seed")]
    MissingDailySeed,
}

/// Immutable input of a round session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundConfig {
    juz: Vec<u8>,
    difficulty: Difficulty,
    question_count: u32,
    mode: GameMode,
    daily_seed: Option<Date>,
}

impl RoundConfig {
    /// Validate and normalize a configuration; the Juz list is sorted and deduplicated.
    pub fn new(
        juz: Vec<u8>,
        difficulty: Difficulty,
        question_count: u32,
        mode: GameMode,
    ) -> Result<Self, RoundConfigError> {
        if mode.is_daily() {
            return Err(RoundConfigError::MissingDailySeed);
        }
        Self::build(juz, difficulty, question_count, mode)
    }

    /// Daily challenge configuration seeded by `date`; `juz` must already be in range.
    pub(crate) fn daily_unchecked(
        juz: u8,
        difficulty: Difficulty,
        question_count: u32,
        date: Date,
    ) -> Self {
        debug_assert!((1..=JUZ_COUNT).contains(&juz));
        Self {
            juz: vec![juz],
            difficulty,
            question_count,
            mode: GameMode::DailyChallenge,
            daily_seed: Some(date),
        }
    }

    fn build(
        mut juz: Vec<u8>,
        difficulty: Difficulty,
        question_count: u32,
        mode: GameMode,
    ) -> Result<Self, RoundConfigError> {
        if juz.is_empty() {
            return Err(RoundConfigError::EmptyJuz);
        }
        if let Some(&invalid) = juz.iter().find(|j| !(1..=JUZ_COUNT).contains(*j)) {
            return Err(RoundConfigError::JuzOutOfRange(invalid));
        }
        if question_count == 0 {
            return Err(RoundConfigError::ZeroQuestions);
        }

        juz.sort_unstable();
        juz.dedup();

        Ok(Self {
            juz,
            difficulty,
            question_count,
            mode,
            daily_seed: None,
        })
    }

    /// Selected Juz numbers, ascending.
    pub fn juz(&self) -> &[u8] {
        &self.juz
    }

    /// Requested difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Requested number of questions.
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Mode chosen by the player (may be [`GameMode::DailyChallenge`]).
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Date seed of a daily challenge.
    pub fn daily_seed(&self) -> Option<Date> {
        self.daily_seed
    }

    /// Question style actually played. A daily challenge resolves to the mode of its seed day.
    pub fn effective_mode(&self) -> GameMode {
        match (self.mode, self.daily_seed) {
            (GameMode::DailyChallenge, Some(date)) => daily_mode_for(date),
            (GameMode::DailyChallenge, None) => GameMode::MultipleChoice,
            (mode, _) => mode,
        }
    }
}

/// Player identity: just a name plus an optional picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name, also the identity key.
    pub name: String,
    /// Small encoded image (data URL).
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn question(options: &[&str], correct: &str) -> Question {
        Question {
            question_text: "Lanjutkan ayat berikut".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.into(),
            reference: "Al-Fatihah: 2".into(),
        }
    }

    #[test]
    fn well_formed_question_requires_four_options_and_correct_answer() {
        assert!(question(&["a", "b", "c", "d"], "c").is_well_formed());
        assert!(!question(&["a", "b", "c"], "c").is_well_formed());
        assert!(!question(&["a", "b", "c", "d"], "e").is_well_formed());
        assert!(!question(&["a", "b", "c", "d", "e"], "a").is_well_formed());
    }

    #[test]
    fn config_normalizes_juz() {
        let config = RoundConfig::new(vec![3, 1, 3, 2], Difficulty::Easy, 5, GameMode::FillBlank)
            .unwrap();
        assert_eq!(config.juz(), &[1, 2, 3]);
        assert_eq!(config.effective_mode(), GameMode::FillBlank);
    }

    #[test]
    fn config_rejects_invalid_input() {
        assert_eq!(
            RoundConfig::new(vec![], Difficulty::Easy, 5, GameMode::MultipleChoice),
            Err(RoundConfigError::EmptyJuz)
        );
        assert_eq!(
            RoundConfig::new(vec![31], Difficulty::Easy, 5, GameMode::MultipleChoice),
            Err(RoundConfigError::JuzOutOfRange(31))
        );
        assert_eq!(
            RoundConfig::new(vec![0], Difficulty::Easy, 5, GameMode::MultipleChoice),
            Err(RoundConfigError::JuzOutOfRange(0))
        );
        assert_eq!(
            RoundConfig::new(vec![1], Difficulty::Easy, 0, GameMode::MultipleChoice),
            Err(RoundConfigError::ZeroQuestions)
        );
        assert_eq!(
            RoundConfig::new(vec![1], Difficulty::Easy, 5, GameMode::DailyChallenge),
            Err(RoundConfigError::MissingDailySeed)
        );
    }

    #[test]
    fn daily_config_resolves_mode_from_seed() {
        // 2026-10-19: day 19 % 3 == 1
        let config = RoundConfig::daily_unchecked(2, Difficulty::Medium, 10, date!(2026 - 10 - 19));
        assert_eq!(config.mode(), GameMode::DailyChallenge);
        assert_eq!(config.effective_mode(), GameMode::GuessSurah);
    }

    #[test]
    fn enums_serialize_with_stored_labels() {
        assert_eq!(
            serde_json::to_string(&GameMode::DailyChallenge).unwrap(),
            "\"Tantangan Harian\""
        );
        assert_eq!(
            serde_json::from_str::<Difficulty>("\"Susah\"").unwrap(),
            Difficulty::Hard
        );
    }
}
