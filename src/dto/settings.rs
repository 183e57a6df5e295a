use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::round::RoundView;

/// New credential for the question source.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ApiKeyRequest {
    /// New credential for the question source.
    #[validate(length(min = 1))]
    pub api_key: String,
}

/// Outcome of a credential change.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyResponse {
    /// Round restarted because it had failed on the previous credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
}

/// Sound preference.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MuteSetting {
    /// Whether sounds are muted.
    pub muted: bool,
}
