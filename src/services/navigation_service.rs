use tracing::{debug, info};

use crate::{
    dto::screen::VisibleScreen,
    error::ServiceError,
    services::sse_events::broadcast_screen_changed,
    state::{SharedState, screen::ScreenEvent},
};

/// Apply a screen move without payload. Leaving the finished screen releases the round.
pub async fn navigate(
    state: &SharedState,
    event: ScreenEvent,
) -> Result<VisibleScreen, ServiceError> {
    let (_, next) = state
        .run_transition(event, || async {
            if matches!(event, ScreenEvent::PlayAgain | ScreenEvent::ShowLeaderboard) {
                if let Some(round) = state.round().lock().await.take() {
                    debug!(round_id = %round.id(), "released finished round");
                }
            }
            Ok(())
        })
        .await?;
    broadcast_screen_changed(state, next).await;

    if event == ScreenEvent::PlayAgain {
        state.reroll_quote().await;
    }
    info!(event = ?event, screen = ?next, "navigated");
    Ok(next.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::slot_store::MemorySlotStore,
        services::{player_service, question_source::DisabledQuestionSource},
        state::{screen::Screen, test_support::state_with},
    };

    #[tokio::test]
    async fn leaderboard_round_trip_from_welcome() {
        let (state, _clock) =
            state_with(MemorySlotStore::new(), Arc::new(DisabledQuestionSource)).await;
        let mut events = state.sse().subscribe();

        assert_eq!(
            navigate(&state, ScreenEvent::ShowLeaderboard).await.unwrap(),
            VisibleScreen::Leaderboard
        );
        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("screen.changed"));
        assert!(event.data.contains("\"leaderboard\""));

        navigate(&state, ScreenEvent::BackToWelcome).await.unwrap();
        assert_eq!(state.screen().await, Screen::Welcome);
    }

    #[tokio::test]
    async fn moves_outside_the_table_are_rejected() {
        let (state, _clock) =
            state_with(MemorySlotStore::new(), Arc::new(DisabledQuestionSource)).await;
        assert!(matches!(
            navigate(&state, ScreenEvent::PlayAgain).await,
            Err(ServiceError::InvalidState(_))
        ));

        player_service::enter_name(&state, "Ali").await.unwrap();
        assert!(navigate(&state, ScreenEvent::ShowLeaderboard).await.is_err());
        assert_eq!(state.screen().await, Screen::Setup);
    }
}
