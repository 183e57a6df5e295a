//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::game::JUZ_COUNT;

/// Longest accepted player name, in characters.
pub const MAX_NAME_CHARS: usize = 40;
/// Largest question count a round may request.
pub const MAX_QUESTION_COUNT: u32 = 30;
/// Upper bound on an encoded profile picture. A 96 px JPEG stays well below it.
pub const MAX_PICTURE_BYTES: usize = 64 * 1024;

/// Validates that a player name is not blank once trimmed and fits [`MAX_NAME_CHARS`].
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a non-empty Juz selection with every entry in `1..=30`.
///
/// # Examples
///
/// ```ignore
/// validate_juz_selection(&[1, 30]) // Ok
/// validate_juz_selection(&[])      // Err - empty
/// validate_juz_selection(&[0])     // Err - out of range
/// ```
pub fn validate_juz_selection(juz: &[u8]) -> Result<(), ValidationError> {
    if juz.is_empty() {
        let mut err = ValidationError::new("juz_empty");
        err.message = Some("Select at least one juz".into());
        return Err(err);
    }

    if let Some(invalid) = juz.iter().find(|j| !(1..=JUZ_COUNT).contains(*j)) {
        let mut err = ValidationError::new("juz_range");
        err.message = Some(format!("Juz {invalid} is outside 1..={JUZ_COUNT}").into());
        return Err(err);
    }

    Ok(())
}

/// Validates an already downscaled picture: an image data URL of bounded size.
pub fn validate_picture(picture: &str) -> Result<(), ValidationError> {
    if !picture.starts_with("data:image/") {
        let mut err = ValidationError::new("picture_format");
        err.message = Some("Picture must be an image data URL".into());
        return Err(err);
    }

    if picture.len() > MAX_PICTURE_BYTES {
        let mut err = ValidationError::new("picture_size");
        err.message = Some(
            format!(
                "Picture must be at most {MAX_PICTURE_BYTES} bytes (got {})",
                picture.len()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
