use tracing::info;

use crate::{
    dto::player::PlayerView,
    error::ServiceError,
    state::{SharedState, game::Player, screen::ScreenEvent, transitions::run_transition_with_broadcast},
};

/// Identify the player by name, restoring their stored picture, and open the setup screen.
pub async fn enter_name(state: &SharedState, name: &str) -> Result<PlayerView, ServiceError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".into()));
    }

    run_transition_with_broadcast(state, ScreenEvent::NameSubmitted, move || async move {
        let profile_picture = state
            .persistent()
            .profile(&name)
            .await
            .map(|profile| profile.profile_picture);
        info!(player = %name, has_picture = profile_picture.is_some(), "player entered");

        let player = Player {
            name,
            profile_picture,
        };
        *state.player().write().await = Some(player.clone());
        Ok(player.into())
    })
    .await
}

/// Current player, if a name was entered.
pub async fn current_player(state: &SharedState) -> Option<PlayerView> {
    state.player().read().await.clone().map(PlayerView::from)
}

/// Store a new picture for the current player.
pub async fn update_picture(
    state: &SharedState,
    picture: String,
) -> Result<PlayerView, ServiceError> {
    let mut guard = state.player().write().await;
    let player = guard
        .as_mut()
        .ok_or_else(|| ServiceError::InvalidState("enter a name first".into()))?;

    state
        .persistent()
        .set_profile_picture(&player.name, picture.clone())
        .await;
    player.profile_picture = Some(picture);
    info!(player = %player.name, "profile picture updated");
    Ok(player.clone().into())
}

/// Persist the sound preference.
pub async fn set_muted(state: &SharedState, muted: bool) -> bool {
    state.persistent().set_muted(muted).await;
    muted
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::slot_store::{MemorySlotStore, Slot},
        services::question_source::DisabledQuestionSource,
        state::{screen::Screen, test_support::state_with},
    };

    const PROFILES: &str = r#"{"Ali":{"profilePicture":"data:image/jpeg;base64,AAA"}}"#;

    async fn state(store: MemorySlotStore) -> SharedState {
        state_with(store, Arc::new(DisabledQuestionSource)).await.0
    }

    #[tokio::test]
    async fn entering_a_known_name_restores_the_picture() {
        let state = state(MemorySlotStore::new().with_slot(Slot::Profiles, PROFILES)).await;

        let player = enter_name(&state, "  Ali ").await.unwrap();
        assert_eq!(player.name, "Ali");
        assert_eq!(
            player.profile_picture.as_deref(),
            Some("data:image/jpeg;base64,AAA")
        );
        assert_eq!(state.screen().await, Screen::Setup);
    }

    #[tokio::test]
    async fn blank_name_keeps_the_welcome_screen() {
        let state = state(MemorySlotStore::new()).await;
        assert!(matches!(
            enter_name(&state, "   ").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(state.screen().await, Screen::Welcome);
        assert!(current_player(&state).await.is_none());
    }

    #[tokio::test]
    async fn picture_update_is_persisted_under_the_name() {
        let store = MemorySlotStore::new();
        let state = state(store.clone()).await;
        assert!(update_picture(&state, "data:image/png;base64,B".into()).await.is_err());

        enter_name(&state, "Zainab").await.unwrap();
        let player = update_picture(&state, "data:image/png;base64,B".into())
            .await
            .unwrap();
        assert_eq!(player.profile_picture.as_deref(), Some("data:image/png;base64,B"));
        assert!(store.raw(Slot::Profiles).unwrap().contains("Zainab"));
    }

    #[tokio::test]
    async fn mute_flag_is_persisted() {
        let store = MemorySlotStore::new();
        let state = state(store.clone()).await;
        assert!(set_muted(&state, true).await);
        assert!(state.persistent().muted().await);
        assert_eq!(store.raw(Slot::Muted).as_deref(), Some("true"));
    }
}
