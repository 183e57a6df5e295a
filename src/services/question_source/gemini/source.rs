use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    services::question_source::{
        QuestionRequest, QuestionSource, QuestionSourceError, QuestionSourceResult, validate_batch,
    },
    state::game::Question,
};

use super::{
    config::GeminiConfig,
    error::{GeminiError, GeminiResult},
    prompts::{build_prompt, response_schema},
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Question source backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiQuestionSource {
    client: Client,
    endpoint: Arc<str>,
    api_key: Arc<RwLock<Option<String>>>,
    max_attempts: u32,
    retry_delay: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiQuestionSource {
    /// Build the HTTP client for `config`.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| GeminiError::ClientBuilder { source })?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint: Arc::from(endpoint),
            api_key: Arc::new(RwLock::new(config.api_key)),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
        })
    }

    fn api_key(&self) -> Option<String> {
        match self.api_key.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn generate(&self, request: QuestionRequest) -> GeminiResult<Vec<Question>> {
        let prompt = build_prompt(&request);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        let mut attempt = 1;
        loop {
            debug!(attempt, max = self.max_attempts, "requesting question batch");
            match self.attempt(&body).await {
                Ok(batch) => {
                    info!(attempt, count = batch.len(), "question batch generated");
                    return Ok(batch);
                }
                Err(err) if err.is_authorization() => {
                    warn!(error = %err, "question source rejected the credential");
                    return Err(err);
                }
                Err(err) if attempt >= self.max_attempts => {
                    warn!(attempt, error = %err, "giving up on question batch");
                    return Err(err);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "question batch attempt failed; retrying");
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, body: &GenerateRequest<'_>) -> GeminiResult<Vec<Question>> {
        let api_key = self.api_key().ok_or(GeminiError::MissingCredential)?;

        let response = self
            .client
            .post(self.endpoint.as_ref())
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|source| GeminiError::RequestSend { source })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let envelope = response
            .json::<GenerateResponse>()
            .await
            .map_err(|source| GeminiError::DecodeResponse { source })?;

        let text = envelope
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect::<String>();
        if text.trim().is_empty() {
            return Err(GeminiError::EmptyResponse);
        }

        let batch = serde_json::from_str::<Vec<Question>>(text.trim())
            .map_err(|source| GeminiError::ParseBatch { source })?;
        validate_batch(&batch).map_err(|err| GeminiError::InvalidBatch(err.to_string()))?;
        Ok(batch)
    }
}

/// Map a non-success response to an error, singling out rejected credentials.
fn classify_failure(status: StatusCode, body: &str) -> GeminiError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };

    let denied = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || api_status == "PERMISSION_DENIED"
        || api_status == "UNAUTHENTICATED"
        || message.contains("API key not valid");

    if denied {
        GeminiError::PermissionDenied { status, message }
    } else {
        GeminiError::Status { status, message }
    }
}

impl QuestionSource for GeminiQuestionSource {
    fn fetch(&self, request: QuestionRequest) -> BoxFuture<'static, QuestionSourceResult<Vec<Question>>> {
        let source = self.clone();
        Box::pin(async move {
            source
                .generate(request)
                .await
                .map_err(QuestionSourceError::from)
        })
    }

    fn set_credential(&self, credential: String) {
        let mut guard = match self.api_key.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(credential);
        info!("question source credential replaced");
    }
}
