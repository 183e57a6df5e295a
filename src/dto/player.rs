use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::{validate_picture, validate_player_name},
    state::game::Player,
};

/// Name typed on the welcome screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EnterNameRequest {
    /// Player name.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
}

/// New profile picture, already downscaled and re-encoded by the client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePictureRequest {
    /// Image data URL, e.g. `data:image/jpeg;base64,...`.
    #[validate(custom(function = "validate_picture"))]
    pub profile_picture: String,
}

/// Public projection of the current player.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct PlayerView {
    /// Player name.
    pub name: String,
    /// Stored picture as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl From<Player> for PlayerView {
    fn from(value: Player) -> Self {
        Self {
            name: value.name,
            profile_picture: value.profile_picture,
        }
    }
}
