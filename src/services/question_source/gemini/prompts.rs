//! Prompt text and response schema sent to Gemini.

use std::fmt::Write;

use serde_json::{Value, json};

use crate::{
    services::{daily::format_date, question_source::QuestionRequest},
    state::game::{Difficulty, GameMode},
};

/// Structured-output schema: an array of questions with exactly the fields of [`Question`].
///
/// [`Question`]: crate::state::game::Question
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "questionText": {
                    "type": "STRING",
                    "description": "Question shown to the player: an Indonesian prompt for multiple choice, the bare Arabic verse for guess-the-surah, or the Arabic verse with a '[...]' gap for fill-in-the-blank."
                },
                "options": {
                    "type": "ARRAY",
                    "description": "Exactly 4 answer options: Arabic verses, Latin-script surah names or missing Arabic words depending on the question type.",
                    "items": { "type": "STRING" }
                },
                "correctAnswer": {
                    "type": "STRING",
                    "description": "The correct option, identical to one entry of 'options'."
                },
                "reference": {
                    "type": "STRING",
                    "description": "Surah and verse of the correct verse, e.g. 'Al-Baqarah: 255'."
                }
            },
            "required": ["questionText", "options", "correctAnswer", "reference"]
        }
    })
}

/// Full prompt for `request`. The question family follows `request.mode`.
pub fn build_prompt(request: &QuestionRequest) -> String {
    let juz = request
        .juz
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let level = request.difficulty.label();
    let count = request.question_count;

    let (task, brief, instructions, rules) = match request.mode {
        GameMode::FillBlank => (
            format!("{count} 'Fill in the Blank' multiple-choice questions in Bahasa Indonesia"),
            "The player sees an Arabic verse with one or more words replaced by '[...]' and picks the missing words.",
            fill_blank_instructions(request.difficulty),
            FILL_BLANK_RULES,
        ),
        GameMode::GuessSurah => (
            format!("{count} 'Guess the Surah' multiple-choice questions in Bahasa Indonesia"),
            "The player sees one complete verse in Arabic script as 'questionText' and names the surah it belongs to.",
            guess_surah_instructions(request.difficulty),
            GUESS_SURAH_RULES,
        ),
        GameMode::MultipleChoice | GameMode::DailyChallenge => (
            format!("{count} multiple-choice Quran memorization questions in Bahasa Indonesia"),
            "",
            multiple_choice_instructions(request.difficulty),
            MULTIPLE_CHOICE_RULES,
        ),
    };

    let mut prompt = String::new();
    let _ = writeln!(prompt, "You are an expert in the Quran. Generate {task}.");
    if let Some(seed) = request.daily_seed {
        let day = format_date(seed);
        let _ = writeln!(
            prompt,
            "IMPORTANT: this is the Daily Challenge for {day}. Use the date as a seed so every player receives exactly the same questions today, and a set unique to this date."
        );
    }
    let _ = writeln!(prompt, "Base every question on Juz {juz}.");
    let _ = writeln!(prompt, "The difficulty level is {level}.");
    if !brief.is_empty() {
        let _ = writeln!(prompt, "{brief}");
    }
    let _ = writeln!(prompt, "{instructions}");
    let _ = writeln!(prompt, "Rules:");
    for (index, rule) in rules.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {rule}", index + 1);
    }
    let _ = write!(
        prompt,
        "Answer with a JSON array that validates against the provided schema."
    );
    prompt
}

const MULTIPLE_CHOICE_RULES: &[&str] = &[
    "Write every 'questionText' in Bahasa Indonesia.",
    "Give exactly 4 entries in 'options'.",
    "One option is correct; the other three are plausible distractors, preferably from nearby verses or the same surah.",
    "'correctAnswer' must be the exact string of the correct entry in 'options'.",
    "Write all options and the correct answer in Arabic script.",
    "'reference' must identify the correct answer as 'Surah name: verse number'.",
    "Do not repeat questions.",
    "Spread the questions over different surahs of the selected Juz.",
];

const GUESS_SURAH_RULES: &[&str] = &[
    "'questionText' is only the complete Arabic verse, without any Indonesian introduction.",
    "Give exactly 4 entries in 'options'.",
    "Options are surah names in Latin script, e.g. 'Al-Baqarah' or 'Ali 'Imran'.",
    "One option is the correct surah; the other three are plausible wrong surahs, preferably from the same Juz.",
    "'correctAnswer' must be the exact string of the correct surah name in 'options'.",
    "'reference' must identify the verse as 'Surah name: verse number'.",
    "Do not repeat questions.",
    "Spread the questions over different surahs of the selected Juz.",
];

const FILL_BLANK_RULES: &[&str] = &[
    "'questionText' is the Arabic verse with the missing part shown as '[...]'.",
    "Give exactly 4 entries in 'options', each a candidate for the missing Arabic words.",
    "One option is the missing part; the other three are plausible wrong completions.",
    "Write all options and the correct answer in Arabic script.",
    "'correctAnswer' must be the exact string of the correct entry in 'options'.",
    "'reference' must identify the complete verse as 'Surah name: verse number'.",
    "Do not repeat questions.",
    "Always mark the gap with the same '[...]' placeholder.",
];

fn multiple_choice_instructions(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Mudah: show a verse and ask for the verse that follows it, phrased like 'Lanjutkan ayat berikut: [ayat]'. The four options are verses, one being the true next verse."
        }
        Difficulty::Medium => {
            "Sedang: ask for a specific verse of a surah in the selected Juz, phrased like 'Sebutkan bunyi ayat ke-[nomor] dari Surah [nama surah]'. The four options are verses from the same Juz."
        }
        Difficulty::Hard => {
            "Susah: show a fragment or the ending of a verse and ask the player to complete it, phrased like 'Lengkapi potongan ayat berikut: [...potongan ayat...]'. The four options are complete verses that could plausibly finish the fragment."
        }
    }
}

fn guess_surah_instructions(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Mudah: use well-known verses of the selected Juz that are easy to recognize.",
        Difficulty::Medium => {
            "Sedang: use less familiar but still identifiable verses; take the wrong surah names from the same Juz."
        }
        Difficulty::Hard => {
            "Susah: use verses resembling verses of other surahs, or opening and closing verses that are easy to confuse; every distractor must be very plausible."
        }
    }
}

fn fill_blank_instructions(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Mudah: remove one common, easily recognized word from a well-known verse. Distractors should differ clearly in sound or meaning."
        }
        Difficulty::Medium => {
            "Sedang: remove a less common word or two consecutive words. Distractors should be plausible, possibly taken from similar verses (mutashabihat)."
        }
        Difficulty::Hard => {
            "Susah: remove a key phrase from a complex verse that resembles other verses. Distractors must be tricky, possibly differing by a single letter or harakat."
        }
    }
}
