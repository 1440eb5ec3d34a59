//! Keyword extraction via the Gemini `generateContent` API.
//!
//! Requests structured JSON output constrained by `prompt::response_schema()`
//! and validates the reply into a `KeywordResult`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::prompt::{build_prompt, response_schema};
use crate::{ExtractionError, KeywordExtractor, KeywordResult};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "TASKGIST_GEMINI_BASE_URL";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    retry_backoff: Duration,
}

impl GeminiExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_backoff: RATE_LIMIT_BACKOFF,
        }
    }

    /// Build from the environment. Fails without touching the network when
    /// `GEMINI_API_KEY` is unset or blank.
    pub fn from_env() -> Result<Self, ExtractionError> {
        let api_key = resolve_api_key()
            .ok_or(ExtractionError::ConfigurationMissing { var: API_KEY_VAR })?;
        let mut extractor = Self::new(api_key);
        if let Ok(url) = std::env::var(BASE_URL_VAR) {
            if !url.trim().is_empty() {
                extractor = extractor.with_base_url(url);
            }
        }
        Ok(extractor)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Delay before the single retry after a 429.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, body: &Value) -> Result<String, ExtractionError> {
        match self.call_gemini(body).await {
            Err(e) if e.status() == Some(429) => {
                warn!(
                    component = "extraction",
                    event = "extraction.rate_limited",
                    model = %self.model,
                    "Rate limited by Gemini, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                self.call_gemini(body).await
            }
            other => other,
        }
    }

    async fn call_gemini(&self, body: &Value) -> Result<String, ExtractionError> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ExtractionError::provider(format!("Request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ExtractionError::provider(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ExtractionError::Provider {
                message: format!("Gemini API error {}: {}", status, api_error_message(&text)),
                status: Some(status.as_u16()),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl KeywordExtractor for GeminiExtractor {
    async fn extract(&self, task: &str) -> Result<KeywordResult, ExtractionError> {
        let prompt = build_prompt(task);
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "temperature": 0.2,
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        });

        debug!(
            component = "extraction",
            event = "extraction.request",
            model = %self.model,
            task_chars = task.chars().count(),
        );

        let raw = self.generate(&body).await?;
        let result = parse_response(&prompt, &raw)?;

        debug!(
            component = "extraction",
            event = "extraction.response",
            action_verb = %result.action_verb,
            phrases = result.phrase.len(),
        );

        Ok(result)
    }
}

fn resolve_api_key() -> Option<String> {
    let key = std::env::var(API_KEY_VAR).ok()?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Pull the human-readable message out of a Gemini error body, falling back
/// to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Validate a successful `generateContent` body into a `KeywordResult`.
pub fn parse_response(prompt: &str, body: &str) -> Result<KeywordResult, ExtractionError> {
    let invalid = |message: String, raw: &str| {
        ExtractionError::validation(message, Some(prompt.to_string()), Some(raw.to_string()))
    };

    let json: Value = serde_json::from_str(body)
        .map_err(|e| invalid(format!("Response is not JSON: {e}"), body))?;

    let text = json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = json["promptFeedback"]["blockReason"]
            .as_str()
            .or_else(|| json["candidates"][0]["finishReason"].as_str())
            .unwrap_or("no candidates");
        return Err(invalid(format!("Model returned no text ({reason})"), body));
    }

    serde_json::from_str::<KeywordResult>(strip_code_fence(&text))
        .map_err(|e| invalid(e.to_string(), text.as_str()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
