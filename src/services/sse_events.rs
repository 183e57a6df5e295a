use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::slot_store::Slot,
    dto::{
        round::RoundView,
        sse::{
            RoundFinishedEvent, RoundPointsEvent, RoundTickEvent, ScreenChangedEvent, ServerEvent,
            StoreChangedEvent, SystemStatus,
        },
    },
    state::{SharedState, screen::Screen},
};

const EVENT_SCREEN_CHANGED: &str = "screen.changed";
const EVENT_ROUND_PHASE: &str = "round.phase";
const EVENT_ROUND_TICK: &str = "round.tick";
const EVENT_ROUND_POINTS: &str = "round.points";
const EVENT_ROUND_FINISHED: &str = "round.finished";
const EVENT_STORE_CHANGED: &str = "store.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the screen the router settled on, along with the current player.
pub async fn broadcast_screen_changed(state: &SharedState, screen: Screen) {
    let player = state
        .player()
        .read()
        .await
        .as_ref()
        .map(|player| player.name.clone());
    let payload = ScreenChangedEvent {
        screen: screen.into(),
        player,
    };
    send_event(state, EVENT_SCREEN_CHANGED, &payload);
}

/// Broadcast the full round view after a phase change.
pub fn broadcast_round_phase(state: &SharedState, view: &RoundView) {
    send_event(state, EVENT_ROUND_PHASE, view);
}

/// Broadcast the remaining seconds of the current question.
pub fn broadcast_round_tick(state: &SharedState, round_id: Uuid, time_left: u32) {
    let payload = RoundTickEvent {
        round_id,
        time_left,
    };
    send_event(state, EVENT_ROUND_TICK, &payload);
}

/// Broadcast the points gained by a correct answer.
pub fn broadcast_round_points(state: &SharedState, round_id: Uuid, points: u32, score: u32) {
    let payload = RoundPointsEvent {
        round_id,
        points,
        score,
    };
    send_event(state, EVENT_ROUND_POINTS, &payload);
}

/// Broadcast the recorded result of a round.
pub fn broadcast_round_finished(state: &SharedState, payload: &RoundFinishedEvent) {
    send_event(state, EVENT_ROUND_FINISHED, payload);
}

/// Broadcast that another process modified a persisted slot.
pub fn broadcast_store_changed(state: &SharedState, slot: Slot) {
    let payload = StoreChangedEvent {
        slot: slot.key().to_string(),
    };
    send_event(state, EVENT_STORE_CHANGED, &payload);
}

/// Broadcast the degraded flag after it changed.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
