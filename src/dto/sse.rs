use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::screen::VisibleScreen, state::game::GameMode};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name; `None` sends a plain message.
    pub event: Option<String>,
    /// Encoded payload.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already encoded payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the data directory is currently unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the data directory is unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the screen router settles on a new screen.
pub struct ScreenChangedEvent {
    /// Screen the router settled on.
    pub screen: VisibleScreen,
    /// Name of the current player, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Countdown update for the question on display.
pub struct RoundTickEvent {
    /// Round the event belongs to.
    pub round_id: Uuid,
    /// Seconds left on the current question.
    pub time_left: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Transient "points gained" signal after a correct answer.
pub struct RoundPointsEvent {
    /// Round the event belongs to.
    pub round_id: Uuid,
    /// Points gained by the last answer.
    pub points: u32,
    /// Score of the round so far.
    pub score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Final result of a round, sent once its score is recorded.
pub struct RoundFinishedEvent {
    /// Round the event belongs to.
    pub round_id: Uuid,
    /// Player who played the round.
    pub player: String,
    /// Final score as recorded.
    pub score: u32,
    /// Seconds from round start to the last answer.
    pub duration: u64,
    /// Mode the round was played in.
    pub mode: GameMode,
    /// Position of the player in the global ranking, 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_rank: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
/// A persisted slot was modified by another process.
pub struct StoreChangedEvent {
    /// Key of the modified slot.
    pub slot: String,
}
