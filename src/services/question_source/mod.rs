//! Question batch providers.

/// Gemini-backed question source.
#[cfg(feature = "gemini-source")]
pub mod gemini;

use futures::future::BoxFuture;
use thiserror::Error;
use time::Date;

use crate::state::game::{Difficulty, GameMode, Question, RoundConfig};

#[cfg(feature = "gemini-source")]
pub use self::gemini::{GeminiConfig, GeminiQuestionSource};

/// Shown when the source returned nothing usable.
pub const EMPTY_BATCH_MESSAGE: &str = "API tidak menghasilkan pertanyaan atau formatnya salah.";
/// Shown when a question breaks the four-option contract.
pub const MALFORMED_BATCH_MESSAGE: &str = "Data yang dihasilkan tidak sesuai dengan struktur kuis.";

/// Result alias for question sources.
pub type QuestionSourceResult<T> = Result<T, QuestionSourceError>;

/// Classified failure of a batch fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionSourceError {
    /// The credential is missing or was rejected. Never retried automatically.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Network, decoding or validation failure after the source's own retries.
    #[error("{0}")]
    Failed(String),
}

/// Parameters of one batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    /// Juz the questions must come from; non-empty.
    pub juz: Vec<u8>,
    /// Difficulty of the round.
    pub difficulty: Difficulty,
    /// Number of questions wanted; positive.
    pub question_count: u32,
    /// Question family to generate, already resolved for daily rounds.
    pub mode: GameMode,
    /// Set for daily rounds; the source should derive the same set for the same date.
    pub daily_seed: Option<Date>,
}

impl QuestionRequest {
    /// Build the request for a round configuration.
    pub fn for_round(config: &RoundConfig) -> Self {
        Self {
            juz: config.juz().to_vec(),
            difficulty: config.difficulty(),
            question_count: config.question_count(),
            mode: config.effective_mode(),
            daily_seed: config.daily_seed(),
        }
    }
}

/// Provider of question batches.
pub trait QuestionSource: Send + Sync {
    /// Fetch a validated batch, applying the source's own bounded retry policy.
    fn fetch(&self, request: QuestionRequest) -> BoxFuture<'static, QuestionSourceResult<Vec<Question>>>;
    /// Replace the access credential used by later fetches.
    fn set_credential(&self, credential: String);
}

/// Reject empty batches and questions without exactly four options containing the answer.
pub fn validate_batch(batch: &[Question]) -> QuestionSourceResult<()> {
    if batch.is_empty() {
        return Err(QuestionSourceError::Failed(EMPTY_BATCH_MESSAGE.into()));
    }
    if !batch.iter().all(Question::is_well_formed) {
        return Err(QuestionSourceError::Failed(MALFORMED_BATCH_MESSAGE.into()));
    }
    Ok(())
}

/// Source used when no question provider is available; every fetch fails.
pub struct DisabledQuestionSource;

impl QuestionSource for DisabledQuestionSource {
    fn fetch(&self, _request: QuestionRequest) -> BoxFuture<'static, QuestionSourceResult<Vec<Question>>> {
        Box::pin(async {
            Err(QuestionSourceError::Failed(
                "no question source compiled into this build".into(),
            ))
        })
    }

    fn set_credential(&self, _credential: String) {}
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
    fn empty_batch_is_rejected() {
        assert_eq!(
            validate_batch(&[]),
            Err(QuestionSourceError::Failed(EMPTY_BATCH_MESSAGE.into()))
        );
    }

    #[test]
    fn answer_must_be_one_of_four_options() {
        let good = question(&["a", "b", "c", "d"], "c");
        assert!(validate_batch(std::slice::from_ref(&good)).is_ok());

        let missing = question(&["a", "b", "c", "d"], "e");
        let short = question(&["a", "b", "c"], "a");
        for bad in [missing, short] {
            assert_eq!(
                validate_batch(&[good.clone(), bad]),
                Err(QuestionSourceError::Failed(MALFORMED_BATCH_MESSAGE.into()))
            );
        }
    }

    #[test]
    fn daily_request_uses_mode_of_the_day() {
        let config = crate::services::daily::daily_config_for(date!(2026 - 10 - 19));
        let request = QuestionRequest::for_round(&config);

        assert_eq!(request.mode, GameMode::GuessSurah);
        assert_eq!(request.daily_seed, Some(date!(2026 - 10 - 19)));
        assert_eq!(request.question_count, 10);
        assert_eq!(request.difficulty, Difficulty::Medium);
    }
}
