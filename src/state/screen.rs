use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Screens the player can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Name entry.
    Welcome,
    /// Round configuration, daily-challenge preview and leaderboard teaser.
    Setup,
    /// A round session is active (loading, presenting, submitted or failed).
    Playing,
    /// Result of the last round.
    Finished,
    /// Full global and daily leaderboards.
    Leaderboard,
}

/// Events that move the router between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    /// A player name was entered on the welcome screen.
    NameSubmitted,
    /// Open the leaderboard from the welcome or result screen.
    ShowLeaderboard,
    /// Leave setup or the leaderboard for the welcome screen.
    BackToWelcome,
    /// A round was configured and started.
    StartRound,
    /// The active round reported its final score.
    RoundFinished,
    /// The player left the round before it finished.
    AbandonRound,
    /// Configure another round from the result screen.
    PlayAgain,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The screen the router was on when the invalid event was received.
    pub from: Screen,
    /// The event that cannot be applied from this screen.
    pub event: ScreenEvent,
}

/// Errors that can occur when planning a router transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current screen.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned router transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Screen changed since the plan was created.
    ScreenMismatch {
        /// Screen when plan was created.
        expected: Screen,
        /// Current screen.
        actual: Screen,
    },
    /// Router version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned router transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Screen the router is currently on.
    pub from: Screen,
    /// Screen the router will move to.
    pub to: Screen,
    /// Event that triggered this transition.
    pub event: ScreenEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the router state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current screen.
    pub screen: Screen,
    /// Increments on each applied transition.
    pub version: usize,
    /// Target of the pending transition, if any.
    pub pending: Option<Screen>,
}

/// Finite-state screen router.
#[derive(Debug, Clone)]
pub struct ScreenRouter {
    screen: Screen,
    version: usize,
    pending: Option<Plan>,
}

impl Default for ScreenRouter {
    fn default() -> Self {
        Self {
            screen: Screen::Welcome,
            version: 0,
            pending: None,
        }
    }
}

impl ScreenRouter {
    /// Create a router on the welcome screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Create a snapshot of the router state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            screen: self.screen,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate `event` against the transition table and reserve the transition.
    pub fn plan(&mut self, event: ScreenEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.screen,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };
        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply the pending plan, returning the new screen.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<Screen, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.screen != plan.from {
            return Err(ApplyError::ScreenMismatch {
                expected: plan.from,
                actual: self.screen,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.screen = plan.to;
        self.version = plan.version_next;

        Ok(self.screen)
    }

    /// Drop the pending plan, leaving the screen unchanged.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: ScreenEvent) -> Result<Screen, InvalidTransition> {
        let next = match (self.screen, event) {
            (Screen::Welcome, ScreenEvent::NameSubmitted) => Screen::Setup,
            (Screen::Welcome | Screen::Finished, ScreenEvent::ShowLeaderboard) => {
                Screen::Leaderboard
            }
            (Screen::Setup | Screen::Leaderboard, ScreenEvent::BackToWelcome) => Screen::Welcome,
            (Screen::Setup, ScreenEvent::StartRound) => Screen::Playing,
            (Screen::Playing, ScreenEvent::RoundFinished) => Screen::Finished,
            (Screen::Playing, ScreenEvent::AbandonRound) => Screen::Setup,
            (Screen::Finished, ScreenEvent::PlayAgain) => Screen::Setup,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
