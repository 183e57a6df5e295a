use std::{env, time::Duration};

/// Environment variables checked, in order, for the API key.
const API_KEY_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Runtime configuration of the Gemini question source.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, without the model path.
    pub base_url: String,
    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Credential sent with every request.
    pub api_key: Option<String>,
    /// Total attempts per fetch, the first one included.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
    /// Upper bound for a single HTTP request.
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Configuration with the default retry policy and no credential.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Attach the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Pick up the API key from the environment when one is set.
    pub fn with_env_api_key(self) -> Self {
        match API_KEY_ENV
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty())
        {
            Some(key) => self.with_api_key(key),
            None => self,
        }
    }
}
