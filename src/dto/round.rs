use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::validation::{MAX_QUESTION_COUNT, validate_juz_selection},
    state::{
        game::{Difficulty, GameMode},
        round::{AnswerOutcome, RoundPhase, RoundSession},
    },
};

/// Payload starting a round from the setup screen.
///
/// With `mode` set to the daily challenge, the other fields are ignored and the
/// configuration of the day is used.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRoundRequest {
    /// Game mode; the daily challenge ignores the other fields.
    pub mode: GameMode,
    /// Juz to draw questions from, each within 1..=30.
    #[serde(default)]
    pub juz: Vec<u8>,
    /// Difficulty; required outside the daily challenge.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Number of questions; required outside the daily challenge.
    #[serde(default)]
    pub question_count: Option<u32>,
}

impl Validate for StartRoundRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.mode.is_daily() {
            return Ok(());
        }

        if let Err(e) = validate_juz_selection(&self.juz) {
            errors.add("juz", e);
        }

        if self.difficulty.is_none() {
            let mut err = ValidationError::new("difficulty_missing");
            err.message = Some("Choose a difficulty".into());
            errors.add("difficulty", err);
        }

        match self.question_count {
            Some(count) if (1..=MAX_QUESTION_COUNT).contains(&count) => {}
            _ => {
                let mut err = ValidationError::new("question_count_range");
                err.message =
                    Some(format!("Question count must be within 1..={MAX_QUESTION_COUNT}").into());
                errors.add("question_count", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Option picked by the player for the current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectOptionRequest {
    /// Text of the chosen option.
    #[validate(length(min = 1))]
    pub option: String,
}

/// Coarse round phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleRoundPhase {
    /// Questions are being fetched.
    Loading,
    /// A question is shown and the countdown runs.
    Presenting,
    /// The current question is resolved; the correct answer is revealed.
    Submitted,
    /// Every question was answered.
    Finished,
    /// The questions could not be fetched.
    Failed,
}

impl From<&RoundPhase> for VisibleRoundPhase {
    fn from(value: &RoundPhase) -> Self {
        match value {
            RoundPhase::Loading => VisibleRoundPhase::Loading,
            RoundPhase::Presenting { .. } => VisibleRoundPhase::Presenting,
            RoundPhase::Submitted { .. } => VisibleRoundPhase::Submitted,
            RoundPhase::Finished { .. } => VisibleRoundPhase::Finished,
            RoundPhase::Failed(_) => VisibleRoundPhase::Failed,
        }
    }
}

/// How the current question was resolved.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcomeDto {
    /// The selected option was the right one.
    Correct,
    /// The selected option was wrong.
    Incorrect,
    /// The countdown ran out before a submission.
    TimedOut,
}

impl From<AnswerOutcome> for AnswerOutcomeDto {
    fn from(value: AnswerOutcome) -> Self {
        match value {
            AnswerOutcome::Correct => AnswerOutcomeDto::Correct,
            AnswerOutcome::Incorrect => AnswerOutcomeDto::Incorrect,
            AnswerOutcome::TimedOut => AnswerOutcomeDto::TimedOut,
        }
    }
}

/// Question as shown to the player; the answer stays hidden until resolution.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 0-based position in the round.
    pub index: usize,
    /// Verse fragment or prompt shown to the player.
    pub question_text: String,
    /// The four answer options.
    pub options: Vec<String>,
}

/// Why the round could not start.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct RoundFailureView {
    /// Message shown to the player.
    pub message: String,
    /// The credential was rejected; a new one must be supplied before retrying.
    pub requires_api_key: bool,
}

/// Everything the playing and finished screens render.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct RoundView {
    /// Identifier of the round; changes on every start.
    pub round_id: Uuid,
    /// Coarse phase of the round.
    pub phase: VisibleRoundPhase,
    /// Mode chosen by the player; the daily challenge stays `Tantangan Harian`.
    pub mode: GameMode,
    /// Difficulty of the round.
    pub difficulty: Difficulty,
    /// Juz the questions come from.
    pub juz: Vec<u8>,
    /// Questions in the round, or requested while loading.
    pub question_count: usize,
    /// Points earned so far.
    pub score: u32,
    /// Seconds left to answer the current question.
    pub time_left: u32,
    /// Current question while presenting or submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Option picked but not yet submitted, or the submitted one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    /// How the current question was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AnswerOutcomeDto>,
    /// Revealed once the question is resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Surah and verse of the question, revealed with the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Why loading failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RoundFailureView>,
}

impl From<(Uuid, &RoundSession)> for RoundView {
    fn from((round_id, session): (Uuid, &RoundSession)) -> Self {
        let config = session.config();
        let phase = session.phase();

        let question = session.current_question().map(|(index, question)| QuestionView {
            index,
            question_text: question.question_text.clone(),
            options: question.options.clone(),
        });
        let outcome = match phase {
            RoundPhase::Submitted { outcome, .. } => Some((*outcome).into()),
            _ => None,
        };
        let (correct_answer, reference) = match session.reveal() {
            Some((answer, reference)) => (Some(answer.to_string()), Some(reference.to_string())),
            None => (None, None),
        };
        let failure = match phase {
            RoundPhase::Failed(failure) => Some(RoundFailureView {
                message: failure.message().to_string(),
                requires_api_key: failure.is_authorization(),
            }),
            _ => None,
        };
        let question_count = match phase {
            RoundPhase::Loading | RoundPhase::Failed(_) => config.question_count() as usize,
            _ => session.question_count(),
        };

        Self {
            round_id,
            phase: phase.into(),
            mode: config.mode(),
            difficulty: config.difficulty(),
            juz: config.juz().to_vec(),
            question_count,
            score: session.score(),
            time_left: session.time_left(),
            question,
            selected: session.pending_selection().map(str::to_string),
            outcome,
            correct_answer,
            reference,
            failure,
        }
    }
}
