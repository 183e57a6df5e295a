//! Daily challenge rules: the mode and configuration of the day, and the
//! once-per-day completion gate.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::{
    dao::models::DailyCompletions,
    state::game::{Difficulty, GameMode, JUZ_COUNT, RoundConfig},
};

/// Difficulty of every daily challenge.
pub const DAILY_DIFFICULTY: Difficulty = Difficulty::Medium;
/// Number of questions of every daily challenge.
pub const DAILY_QUESTION_COUNT: u32 = 10;

/// Question style of the daily challenge played on `date`, rotating with the day of the month.
pub fn daily_mode_for(date: Date) -> GameMode {
    match date.day() % 3 {
        1 => GameMode::GuessSurah,
        2 => GameMode::FillBlank,
        _ => GameMode::MultipleChoice,
    }
}

/// Juz of the daily challenge, cycling through the 30 Juz by day of the year.
pub fn daily_juz_for(date: Date) -> u8 {
    (date.ordinal() % u16::from(JUZ_COUNT)) as u8 + 1
}

/// Full configuration of the daily challenge for `date`.
pub fn daily_config_for(date: Date) -> RoundConfig {
    RoundConfig::daily_unchecked(
        daily_juz_for(date),
        DAILY_DIFFICULTY,
        DAILY_QUESTION_COUNT,
        date,
    )
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format).unwrap_or_else(|_| date.to_string())
}

/// Format an instant as an RFC 3339 timestamp with second precision.
pub fn format_timestamp(now: OffsetDateTime) -> String {
    let now = now.replace_nanosecond(0).unwrap_or(now);
    now.format(&Rfc3339)
        .unwrap_or_else(|_| format!("{}T00:00:00Z", format_date(now.date())))
}

/// Whether `name` already finished the daily challenge on `today`.
pub fn has_completed_daily(completions: &DailyCompletions, name: &str, today: Date) -> bool {
    completions
        .get(name)
        .is_some_and(|day| *day == format_date(today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn mode_rotates_with_day_of_month() {
        assert_eq!(daily_mode_for(date!(2026 - 10 - 18)), GameMode::MultipleChoice);
        assert_eq!(daily_mode_for(date!(2026 - 10 - 19)), GameMode::GuessSurah);
        assert_eq!(daily_mode_for(date!(2026 - 10 - 20)), GameMode::FillBlank);
        assert_eq!(daily_mode_for(date!(2026 - 10 - 31)), GameMode::GuessSurah);
    }

    #[test]
    fn juz_cycles_through_the_year() {
        assert_eq!(daily_juz_for(date!(2026 - 01 - 01)), 2);
        assert_eq!(daily_juz_for(date!(2026 - 01 - 29)), 30);
        assert_eq!(daily_juz_for(date!(2026 - 01 - 30)), 1);
    }

    #[test]
    fn daily_config_is_fixed_for_the_day() {
        let day = date!(2026 - 10 - 19);
        let config = daily_config_for(day);
        assert_eq!(config.mode(), GameMode::DailyChallenge);
        assert_eq!(config.difficulty(), Difficulty::Medium);
        assert_eq!(config.question_count(), 10);
        assert_eq!(config.juz(), &[daily_juz_for(day)]);
        assert_eq!(config.daily_seed(), Some(day));
        assert_eq!(config.effective_mode(), daily_mode_for(day));
        assert_eq!(daily_config_for(day), config);
    }

    #[test]
    fn completion_blocks_same_day_only() {
        let mut completions = DailyCompletions::new();
        completions.insert("Ali".into(), "2026-10-19".into());

        assert!(has_completed_daily(&completions, "Ali", date!(2026 - 10 - 19)));
        assert!(!has_completed_daily(&completions, "Ali", date!(2026 - 10 - 20)));
        assert!(!has_completed_daily(&completions, "Fatimah", date!(2026 - 10 - 19)));
    }

    #[test]
    fn timestamps_keep_local_offset_and_drop_subseconds() {
        let now = datetime!(2026 - 10 - 19 23:30:15.250 +07:00);
        assert_eq!(format_timestamp(now), "2026-10-19T23:30:15+07:00");
        assert_eq!(format_date(now.date()), "2026-10-19");
    }
}
