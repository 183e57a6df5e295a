//! Error types of the Gemini question source.

use reqwest::StatusCode;
use thiserror::Error;

use crate::services::question_source::QuestionSourceError;

/// Convenient result alias returning [`GeminiError`] failures.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Failures that can occur while generating a question batch.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Building the HTTP client failed.
    #[error("failed to build Gemini client")]
    ClientBuilder {
        /// Underlying HTTP client failure.
        #[source]
        source: reqwest::Error,
    },
    /// No API key was configured.
    #[error("no Gemini API key configured")]
    MissingCredential,
    /// The request could not be sent or timed out.
    #[error("failed to send Gemini request")]
    RequestSend {
        /// Underlying HTTP client failure.
        #[source]
        source: reqwest::Error,
    },
    /// Gemini rejected the credential.
    #[error("PERMISSION_DENIED: {message}")]
    PermissionDenied {
        /// HTTP status of the rejection.
        status: StatusCode,
        /// Error message returned by the API.
        message: String,
    },
    /// Gemini returned an unexpected status code.
    #[error("unexpected Gemini response status {status}: {message}")]
    Status {
        /// HTTP status returned.
        status: StatusCode,
        /// Error message or body returned by the API.
        message: String,
    },
    /// The response envelope could not be decoded.
    #[error("failed to decode Gemini response")]
    DecodeResponse {
        /// Underlying HTTP client failure.
        #[source]
        source: reqwest::Error,
    },
    /// The response carried no generated text.
    #[error("Gemini response contained no text")]
    EmptyResponse,
    /// The generated text is not a question array.
    #[error("generated text is not a question batch")]
    ParseBatch {
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The batch broke the quiz structure.
    #[error("{0}")]
    InvalidBatch(String),
}

impl GeminiError {
    /// Failures caused by the credential, which retrying cannot fix.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            GeminiError::MissingCredential | GeminiError::PermissionDenied { .. }
        )
    }
}

impl From<GeminiError> for QuestionSourceError {
    fn from(err: GeminiError) -> Self {
        if err.is_authorization() {
            QuestionSourceError::Unauthorized(err.to_string())
        } else {
            QuestionSourceError::Failed(err.to_string())
        }
    }
}
