//! Rankings derived from the full score history on every read.

use std::cmp::Ordering;

use indexmap::IndexMap;
use time::Date;

use crate::{dao::models::ScoreRecord, services::daily::format_date};

/// Rows shown on the full leaderboard screen.
pub const LEADERBOARD_SIZE: usize = 50;
/// Rows shown in the setup-screen preview.
pub const PREVIEW_SIZE: usize = 5;

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Player name.
    pub name: String,
    /// Summed score (global) or single-round score (daily).
    pub score: u64,
    /// Round duration in seconds; only meaningful for the daily ranking.
    pub duration: Option<u64>,
}

/// Total score per player, highest first. Equal totals keep first-appearance order.
pub fn global_ranking(history: &[ScoreRecord]) -> Vec<LeaderboardEntry> {
    let mut totals: IndexMap<&str, u64> = IndexMap::new();
    for record in history {
        let total = totals.entry(record.name.as_str()).or_default();
        *total = total.saturating_add(u64::from(record.score));
    }

    let mut entries = totals
        .into_iter()
        .map(|(name, score)| LeaderboardEntry {
            name: name.to_string(),
            score,
            duration: None,
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

/// Best daily-challenge round per player on `date`, by score then speed.
pub fn daily_ranking(history: &[ScoreRecord], date: Date) -> Vec<LeaderboardEntry> {
    let day = format_date(date);
    let mut best: IndexMap<&str, &ScoreRecord> = IndexMap::new();

    for record in history
        .iter()
        .filter(|record| record.game_mode.is_daily() && record.date.starts_with(&day))
    {
        best.entry(record.name.as_str())
            .and_modify(|current| {
                if compare_rounds(record, *current) == Ordering::Less {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut rounds = best.into_values().collect::<Vec<_>>();
    rounds.sort_by(|a, b| compare_rounds(a, b));
    rounds
        .into_iter()
        .map(|record| LeaderboardEntry {
            name: record.name.clone(),
            score: u64::from(record.score),
            duration: record.duration,
        })
        .collect()
}

/// Daily ordering: higher score first, then shorter duration, missing duration last.
fn compare_rounds(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.score.cmp(&a.score).then_with(|| match (a.duration, b.duration) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

/// 1-based position of `name`, `None` when unranked.
pub fn rank_of(entries: &[LeaderboardEntry], name: &str) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.name == name)
        .map(|index| index + 1)
}

/// First `n` entries of a ranking.
pub fn top(entries: &[LeaderboardEntry], n: usize) -> &[LeaderboardEntry] {
    &entries[..entries.len().min(n)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{Difficulty, GameMode};
    use time::macros::date;

    fn record(name: &str, score: u32, date: &str, mode: GameMode, duration: Option<u64>) -> ScoreRecord {
        ScoreRecord {
            name: name.into(),
            score,
            date: date.into(),
            juz: vec![1],
            difficulty: Difficulty::Medium,
            number_of_questions: 10,
            game_mode: mode,
            duration,
        }
    }

    fn history() -> Vec<ScoreRecord> {
        vec![
            record("Ali", 40, "2026-10-18T09:00:00+07:00", GameMode::MultipleChoice, Some(50)),
            record("Zaid", 100, "2026-10-19T09:00:00+07:00", GameMode::DailyChallenge, Some(90)),
            record("Ali", 100, "2026-10-19T10:00:00+07:00", GameMode::DailyChallenge, Some(80)),
            record("Umar", 100, "2026-10-19T11:00:00+07:00", GameMode::DailyChallenge, None),
            record("Aisyah", 60, "2026-10-19T12:00:00+07:00", GameMode::GuessSurah, Some(10)),
            record("Fatimah", 200, "2026-10-18T12:00:00+07:00", GameMode::DailyChallenge, Some(5)),
        ]
    }

    #[test]
    fn global_totals_equal_per_player_sums() {
        let history = history();
        let ranking = global_ranking(&history);

        for entry in &ranking {
            let expected: u64 = history
                .iter()
                .filter(|r| r.name == entry.name)
                .map(|r| u64::from(r.score))
                .sum();
            assert_eq!(entry.score, expected);
        }
        assert_eq!(ranking.len(), 5);
        assert_eq!(ranking[0].name, "Fatimah");
        assert_eq!(ranking[1].name, "Ali");
        assert_eq!(ranking[1].score, 140);
    }

    #[test]
    fn global_totals_do_not_wrap_on_large_stored_scores() {
        let history = vec![
            record("Ali", 3_000_000_000, "2026-10-18T09:00:00+07:00", GameMode::MultipleChoice, None),
            record("Ali", u32::MAX, "2026-10-19T09:00:00+07:00", GameMode::MultipleChoice, None),
            record("Zaid", 10, "2026-10-19T09:00:00+07:00", GameMode::MultipleChoice, None),
        ];
        let ranking = global_ranking(&history);

        assert_eq!(ranking[0].name, "Ali");
        assert_eq!(ranking[0].score, 3_000_000_000 + u64::from(u32::MAX));
        assert_eq!(ranking[1].score, 10);
    }

    #[test]
    fn global_ties_keep_first_appearance_order() {
        let ranking = global_ranking(&history());
        let names = ranking.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Fatimah", "Ali", "Zaid", "Umar", "Aisyah"]);
    }

    #[test]
    fn daily_keeps_only_todays_challenges_sorted_by_score_then_duration() {
        let ranking = daily_ranking(&history(), date!(2026 - 10 - 19));
        let names = ranking.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Ali", "Zaid", "Umar"]);
        assert_eq!(ranking[0].duration, Some(80));
        assert_eq!(ranking[2].duration, None);
    }

    #[test]
    fn daily_keeps_best_round_per_player() {
        let mut history = history();
        history.push(record("Zaid", 120, "2026-10-19T20:00:00+07:00", GameMode::DailyChallenge, Some(200)));
        history.push(record("Ali", 20, "2026-10-19T21:00:00+07:00", GameMode::DailyChallenge, Some(1)));

        let ranking = daily_ranking(&history, date!(2026 - 10 - 19));
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].name, "Zaid");
        assert_eq!(ranking[0].score, 120);
        assert_eq!(ranking[1].name, "Ali");
        assert_eq!(ranking[1].score, 100);
    }

    #[test]
    fn rank_is_one_based_or_unranked() {
        let ranking = daily_ranking(&history(), date!(2026 - 10 - 19));
        assert_eq!(rank_of(&ranking, "Ali"), Some(1));
        assert_eq!(rank_of(&ranking, "Umar"), Some(3));
        assert_eq!(rank_of(&ranking, "Aisyah"), None);
        assert!(daily_ranking(&[], date!(2026 - 10 - 19)).is_empty());
    }

    #[test]
    fn top_caps_the_view() {
        let ranking = global_ranking(&history());
        assert_eq!(top(&ranking, 2).len(), 2);
        assert_eq!(top(&ranking, PREVIEW_SIZE).len(), 5);
        assert_eq!(top(&ranking, LEADERBOARD_SIZE).len(), 5);
    }
}
