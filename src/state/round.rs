//! Round session: one play-through from question fetch to final score.
//!
//! The machine is synchronous and clock-free. Timer ticks, the fetch result
//! and the post-timeout delay are fed in by the round driver in
//! `services::round_service`.

use std::time::Duration;

use thiserror::Error;

use crate::{
    services::question_source::{QuestionSourceError, validate_batch},
    state::game::{Question, RoundConfig},
};

/// Ticks (seconds) available to answer one question.
pub const QUESTION_TIME_LIMIT: u32 = 30;
/// Points awarded for a correct answer.
pub const POINTS_PER_CORRECT: u32 = 20;
/// How long the correct answer stays visible after a timeout before auto-advancing.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(2);

/// Classified reason a round could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The access credential was rejected; ask for a new one before retrying.
    Unauthorized(String),
    /// Network, malformed batch or validation failure; plain retry.
    Generic(String),
}

impl FetchFailure {
    /// Human-readable reason.
    pub fn message(&self) -> &str {
        match self {
            FetchFailure::Unauthorized(message) | FetchFailure::Generic(message) => message,
        }
    }

    /// Whether the caller must request new credentials.
    pub fn is_authorization(&self) -> bool {
        matches!(self, FetchFailure::Unauthorized(_))
    }
}

impl From<QuestionSourceError> for FetchFailure {
    fn from(err: QuestionSourceError) -> Self {
        match err {
            QuestionSourceError::Unauthorized(message) => FetchFailure::Unauthorized(message),
            other => FetchFailure::Generic(other.to_string()),
        }
    }
}

/// How a question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Submitted option matched the correct answer.
    Correct,
    /// Submitted option did not match.
    Incorrect,
    /// The countdown ran out before a submission.
    TimedOut,
}

/// Phases of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    /// Waiting for the question batch.
    Loading,
    /// Question `index` is shown and the countdown runs.
    Presenting {
        /// Zero-based question index.
        index: usize,
    },
    /// Question `index` is resolved and the correct answer is revealed.
    Submitted {
        /// Zero-based question index.
        index: usize,
        /// Resolution of the question.
        outcome: AnswerOutcome,
    },
    /// Every question was resolved.
    Finished {
        /// Total score of the round.
        score: u32,
    },
    /// The batch could not be obtained.
    Failed(FetchFailure),
}

/// Inputs accepted by the round machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// The question source delivered a batch.
    QuestionsLoaded(Vec<Question>),
    /// The question source failed.
    FetchFailed(FetchFailure),
    /// The player picked (or re-picked) an option.
    Select(String),
    /// The player committed the pending option.
    Submit,
    /// One second elapsed.
    Tick,
    /// Move past a resolved question.
    Advance,
    /// Re-enter loading after a failure.
    Retry,
}

/// Observable effect of an applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundStep {
    /// Batch accepted, first question presented.
    Started {
        /// Number of questions in the round.
        question_count: usize,
    },
    /// Loading failed.
    Failed(FetchFailure),
    /// Pending selection replaced.
    Selected,
    /// Countdown decreased without running out.
    Ticked {
        /// Remaining seconds.
        time_left: u32,
    },
    /// A question was resolved by submission or timeout.
    Answered {
        /// Zero-based question index.
        index: usize,
        /// Resolution of the question.
        outcome: AnswerOutcome,
        /// Points added to the running score (transient "points gained" signal).
        points_gained: u32,
    },
    /// The next question is presented.
    Presenting {
        /// Zero-based question index.
        index: usize,
    },
    /// The round ended.
    Finished {
        /// Total score of the round.
        score: u32,
    },
    /// Back to loading after a failure.
    Reloading,
}

/// Errors returned when an event cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The event is not valid in the current phase.
    #[error("invalid round transition: {event:?} cannot be applied while in {from:?}")]
    InvalidTransition {
        /// Phase the round was in.
        from: RoundPhase,
        /// Rejected event.
        event: RoundEvent,
    },
    /// Submit without a pending selection.
    #[error("no option selected")]
    NoSelection,
    /// Selected text is not one of the current options.
    #[error("`{0}` is not an option of the current question")]
    UnknownOption(String),
}

/// State of one play-through.
#[derive(Debug, Clone)]
pub struct RoundSession {
    config: RoundConfig,
    phase: RoundPhase,
    questions: Vec<Question>,
    score: u32,
    pending: Option<String>,
    time_left: u32,
    version: usize,
    reported: bool,
}

impl RoundSession {
    /// New session in [`RoundPhase::Loading`].
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            phase: RoundPhase::Loading,
            questions: Vec::new(),
            score: 0,
            pending: None,
            time_left: QUESTION_TIME_LIMIT,
            version: 0,
            reported: false,
        }
    }

    /// Configuration the round was started with.
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    /// Incremented on every phase change; ticks and selections leave it untouched.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Running score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Remaining seconds for the current question.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Option chosen but not yet submitted.
    pub fn pending_selection(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Number of questions in the loaded batch.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Question currently shown (presenting or submitted) with its index.
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        let index = match self.phase {
            RoundPhase::Presenting { index } | RoundPhase::Submitted { index, .. } => index,
            _ => return None,
        };
        self.questions.get(index).map(|question| (index, question))
    }

    /// Correct answer and its reference, exposed only once the question is resolved.
    pub fn reveal(&self) -> Option<(&str, &str)> {
        match self.phase {
            RoundPhase::Submitted { index, .. } => self
                .questions
                .get(index)
                .map(|q| (q.correct_answer.as_str(), q.reference.as_str())),
            _ => None,
        }
    }

    /// Hand out the final score. Returns it once after finishing, then `None`.
    pub fn take_final_score(&mut self) -> Option<u32> {
        match self.phase {
            RoundPhase::Finished { score } if !self.reported => {
                self.reported = true;
                Some(score)
            }
            _ => None,
        }
    }

    /// Feed the fetch result into a loading round.
    pub fn questions_loaded(
        &mut self,
        result: Result<Vec<Question>, QuestionSourceError>,
    ) -> Result<RoundStep, RoundError> {
        match result {
            Ok(batch) => self.apply(RoundEvent::QuestionsLoaded(batch)),
            Err(err) => self.apply(RoundEvent::FetchFailed(err.into())),
        }
    }

    /// Pick an option for the current question.
    pub fn select(&mut self, option: impl Into<String>) -> Result<RoundStep, RoundError> {
        self.apply(RoundEvent::Select(option.into()))
    }

    /// Commit the pending option.
    pub fn submit(&mut self) -> Result<RoundStep, RoundError> {
        self.apply(RoundEvent::Submit)
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> Result<RoundStep, RoundError> {
        self.apply(RoundEvent::Tick)
    }

    /// Leave a resolved question.
    pub fn advance(&mut self) -> Result<RoundStep, RoundError> {
        self.apply(RoundEvent::Advance)
    }

    /// Restart loading after a failure.
    pub fn retry(&mut self) -> Result<RoundStep, RoundError> {
        self.apply(RoundEvent::Retry)
    }

    /// Apply an event according to the round transition table.
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundStep, RoundError> {
        match (self.phase.clone(), event) {
            (RoundPhase::Loading, RoundEvent::QuestionsLoaded(batch)) => {
                if let Err(err) = validate_batch(&batch) {
                    return Ok(self.fail(err.into()));
                }
                let mut batch = batch;
                batch.truncate(self.config.question_count() as usize);
                self.questions = batch;
                self.score = 0;
                self.present(0);
                Ok(RoundStep::Started {
                    question_count: self.questions.len(),
                })
            }
            (RoundPhase::Loading, RoundEvent::FetchFailed(failure)) => Ok(self.fail(failure)),
            (RoundPhase::Presenting { index }, RoundEvent::Select(option)) => {
                let known = self
                    .questions
                    .get(index)
                    .is_some_and(|q| q.options.contains(&option));
                if !known {
                    return Err(RoundError::UnknownOption(option));
                }
                self.pending = Some(option);
                Ok(RoundStep::Selected)
            }
            (RoundPhase::Presenting { index }, RoundEvent::Submit) => {
                let Some(choice) = self.pending.as_deref() else {
                    return Err(RoundError::NoSelection);
                };
                let correct = self
                    .questions
                    .get(index)
                    .is_some_and(|q| q.correct_answer == choice);
                let (outcome, points_gained) = if correct {
                    (AnswerOutcome::Correct, POINTS_PER_CORRECT)
                } else {
                    (AnswerOutcome::Incorrect, 0)
                };
                Ok(self.resolve(index, outcome, points_gained))
            }
            (RoundPhase::Presenting { index }, RoundEvent::Tick) => {
                self.time_left = self.time_left.saturating_sub(1);
                if self.time_left == 0 {
                    Ok(self.resolve(index, AnswerOutcome::TimedOut, 0))
                } else {
                    Ok(RoundStep::Ticked {
                        time_left: self.time_left,
                    })
                }
            }
            (RoundPhase::Submitted { index, .. }, RoundEvent::Advance) => {
                let next = index + 1;
                if next < self.questions.len() {
                    self.present(next);
                    Ok(RoundStep::Presenting { index: next })
                } else {
                    self.transition(RoundPhase::Finished { score: self.score });
                    Ok(RoundStep::Finished { score: self.score })
                }
            }
            (RoundPhase::Failed(_), RoundEvent::Retry) => {
                self.questions.clear();
                self.transition(RoundPhase::Loading);
                Ok(RoundStep::Reloading)
            }
            (from, event) => Err(RoundError::InvalidTransition { from, event }),
        }
    }

    fn present(&mut self, index: usize) {
        self.pending = None;
        self.time_left = QUESTION_TIME_LIMIT;
        self.transition(RoundPhase::Presenting { index });
    }

    fn resolve(&mut self, index: usize, outcome: AnswerOutcome, points_gained: u32) -> RoundStep {
        self.score += points_gained;
        self.transition(RoundPhase::Submitted { index, outcome });
        RoundStep::Answered {
            index,
            outcome,
            points_gained,
        }
    }

    fn fail(&mut self, failure: FetchFailure) -> RoundStep {
        self.transition(RoundPhase::Failed(failure.clone()));
        RoundStep::Failed(failure)
    }

    fn transition(&mut self, next: RoundPhase) {
        self.phase = next;
        self.version += 1;
    }
}
