//! Read-only projections: leaderboards, the setup overview and the current screen.

use crate::{
    dao::models::PlayerProfiles,
    dto::{
        leaderboard::{LeaderboardResponse, LeaderboardRow, RankResponse},
        screen::ScreenResponse,
        setup::{DailyChallengePreview, SetupResponse},
    },
    services::{
        daily::{daily_config_for, daily_mode_for, format_date, has_completed_daily},
        leaderboard::{
            LEADERBOARD_SIZE, LeaderboardEntry, PREVIEW_SIZE, daily_ranking, global_ranking,
            rank_of, top,
        },
        player_service,
    },
    state::SharedState,
};

/// Top of the all-time ranking, by summed score.
pub async fn global_leaderboard(state: &SharedState) -> LeaderboardResponse {
    let entries = state
        .persistent()
        .with_data(|data| {
            let ranking = global_ranking(&data.scores);
            rows(top(&ranking, LEADERBOARD_SIZE), &data.profiles)
        })
        .await;
    LeaderboardResponse {
        entries,
        date: None,
    }
}

/// Top of today's daily-challenge ranking, by score then speed.
pub async fn daily_leaderboard(state: &SharedState) -> LeaderboardResponse {
    let today = state.clock().today();
    let entries = state
        .persistent()
        .with_data(|data| {
            let ranking = daily_ranking(&data.scores, today);
            rows(top(&ranking, LEADERBOARD_SIZE), &data.profiles)
        })
        .await;
    LeaderboardResponse {
        entries,
        date: Some(format_date(today)),
    }
}

/// Position of `name` in both rankings.
pub async fn player_rank(state: &SharedState, name: &str) -> RankResponse {
    let today = state.clock().today();
    let (global_rank, total_score, daily_rank) = state
        .persistent()
        .with_scores(|history| {
            let global = global_ranking(history);
            let global_rank = rank_of(&global, name);
            let total_score = global_rank.map(|rank| global[rank - 1].score);
            let daily_rank = rank_of(&daily_ranking(history, today), name);
            (global_rank, total_score, daily_rank)
        })
        .await;

    RankResponse {
        name: name.to_string(),
        global_rank,
        total_score,
        daily_rank,
    }
}

/// Daily challenge preview, top-5 players, motivational quote and sound preference.
pub async fn setup_overview(state: &SharedState) -> SetupResponse {
    let today = state.clock().today();
    let player = player_service::current_player(state).await;
    let (completed, top_players, muted) = state
        .persistent()
        .with_data(|data| {
            let completed = player.as_ref().is_some_and(|player| {
                has_completed_daily(&data.daily_completions, &player.name, today)
            });
            let ranking = global_ranking(&data.scores);
            (
                completed,
                rows(top(&ranking, PREVIEW_SIZE), &data.profiles),
                data.muted,
            )
        })
        .await;

    let config = daily_config_for(today);
    SetupResponse {
        player,
        daily: DailyChallengePreview {
            date: format_date(today),
            mode: daily_mode_for(today),
            juz: config.juz().to_vec(),
            difficulty: config.difficulty(),
            question_count: config.question_count(),
            completed,
        },
        top_players,
        quote: state.quote().await,
        muted,
    }
}

/// Current screen with the player and global flags.
pub async fn screen_overview(state: &SharedState) -> ScreenResponse {
    ScreenResponse {
        screen: state.screen().await.into(),
        player: player_service::current_player(state).await,
        muted: state.persistent().muted().await,
        degraded: state.is_degraded(),
    }
}

fn rows(entries: &[LeaderboardEntry], profiles: &PlayerProfiles) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardRow {
            rank: index + 1,
            name: entry.name.clone(),
            score: entry.score,
            duration: entry.duration,
            profile_picture: profiles
                .get(&entry.name)
                .map(|profile| profile.profile_picture.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::slot_store::{MemorySlotStore, Slot},
        services::question_source::DisabledQuestionSource,
        state::{game::GameMode, test_support::state_with},
    };

    const SCORES: &str = r#"{"version":1,"data":[
        {"name":"Ali","score":40,"date":"2026-10-18T08:00:00+07:00","juz":[30],"difficulty":"Mudah","numberOfQuestions":5,"gameMode":"Pilihan Ganda","duration":50},
        {"name":"Budi","score":60,"date":"2026-10-19T08:00:00+07:00","juz":[3],"difficulty":"Sedang","numberOfQuestions":10,"gameMode":"Tantangan Harian","duration":120},
        {"name":"Ali","score":60,"date":"2026-10-19T08:30:00+07:00","juz":[3],"difficulty":"Sedang","numberOfQuestions":10,"gameMode":"Tantangan Harian","duration":90}
    ]}"#;
    const PROFILES: &str = r#"{"Budi":{"profilePicture":"data:image/jpeg;base64,BB"}}"#;

    async fn state() -> SharedState {
        let store = MemorySlotStore::new()
            .with_slot(Slot::Scores, SCORES)
            .with_slot(Slot::Profiles, PROFILES)
            .with_slot(Slot::DailyCompletions, r#"{"Ali":"2026-10-19"}"#);
        state_with(store, Arc::new(DisabledQuestionSource)).await.0
    }

    #[tokio::test]
    async fn global_rows_are_ranked_and_decorated() {
        let state = state().await;
        let board = global_leaderboard(&state).await;

        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].name, "Ali");
        assert_eq!(board.entries[0].score, 100);
        assert_eq!(board.entries[0].rank, 1);
        assert!(board.entries[0].profile_picture.is_none());
        assert_eq!(
            board.entries[1].profile_picture.as_deref(),
            Some("data:image/jpeg;base64,BB")
        );
        assert!(board.date.is_none());
    }

    #[tokio::test]
    async fn daily_rows_break_ties_by_duration() {
        let state = state().await;
        let board = daily_leaderboard(&state).await;

        assert_eq!(board.date.as_deref(), Some("2026-10-19"));
        let names: Vec<_> = board.entries.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["Ali", "Budi"]);
        assert_eq!(board.entries[0].duration, Some(90));
    }

    #[tokio::test]
    async fn rank_covers_both_rankings() {
        let state = state().await;
        let rank = player_rank(&state, "Budi").await;
        assert_eq!(rank.global_rank, Some(2));
        assert_eq!(rank.total_score, Some(60));
        assert_eq!(rank.daily_rank, Some(2));

        let unknown = player_rank(&state, "Zaid").await;
        assert!(unknown.global_rank.is_none());
        assert!(unknown.total_score.is_none());
    }

    #[tokio::test]
    async fn setup_shows_daily_completion_for_the_player() {
        let state = state().await;
        let anonymous = setup_overview(&state).await;
        assert!(!anonymous.daily.completed);
        assert_eq!(anonymous.daily.mode, GameMode::GuessSurah);
        assert_eq!(anonymous.daily.question_count, 10);
        assert_eq!(anonymous.top_players.len(), 2);
        assert!(!anonymous.quote.is_empty());

        player_service::enter_name(&state, "Ali").await.unwrap();
        assert!(setup_overview(&state).await.daily.completed);
    }

    #[tokio::test]
    async fn daily_completion_expires_with_the_day() {
        let store = MemorySlotStore::new().with_slot(Slot::DailyCompletions, r#"{"Ali":"2026-10-19"}"#);
        let (state, clock) = state_with(store, Arc::new(DisabledQuestionSource)).await;
        player_service::enter_name(&state, "Ali").await.unwrap();
        assert!(setup_overview(&state).await.daily.completed);

        clock.set(time::macros::datetime!(2026-10-20 06:00 +07:00));
        let next_day = setup_overview(&state).await;
        assert!(!next_day.daily.completed);
        assert_eq!(next_day.daily.date, "2026-10-20");
    }
}
