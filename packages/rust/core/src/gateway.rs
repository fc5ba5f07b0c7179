//! Language-model gateway.
//!
//! [`LanguageModel`] is the seam the pipelines depend on: one prompt in, raw
//! text out. [`OpenRouterModel`] is the production implementation, talking
//! to the OpenRouter chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use founderfuel_shared::{
    AppConfig, FounderFuelError, OpenRouterConfig, Result, validate_api_key,
};

use crate::prompt::TaskKind;

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    /// Model id override; `None` means the gateway's default model.
    pub model: Option<String>,
}

impl GenerationParams {
    /// Default settings for `task`, optionally pinned to a specific model.
    pub fn for_task(task: TaskKind, model: Option<String>) -> Self {
        Self {
            temperature: task.temperature(),
            model,
        }
    }
}

/// A text-completion backend. Implementations must be safe to share across
/// concurrent pipeline runs.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Invoke the model once and return its raw text output.
    ///
    /// Any failure of the call itself is a [`FounderFuelError::Generation`].
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterModel {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenRouterModel {
    /// Build a client from the `[openrouter]` section and a resolved API key.
    pub fn new(config: &OpenRouterConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FounderFuelError::Generation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.default_model.clone(),
        })
    }

    /// Build a client from the full config, reading the key from the
    /// configured environment variable.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Self::new(&config.openrouter, api_key)
    }

    /// The model used when a call does not override it.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[async_trait]
impl LanguageModel for OpenRouterModel {
    #[instrument(skip_all, fields(model = tracing::field::Empty, temperature = params.temperature))]
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let model = params.model.as_deref().unwrap_or(&self.default_model);
        tracing::Span::current().record("model", model);

        let request = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("X-Title", "FounderFuel")
            .json(&request)
            .send()
            .await
            .map_err(|e| FounderFuelError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = body.trim(), "model provider returned an error");
            return Err(FounderFuelError::Generation(format!(
                "provider returned HTTP {status}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| FounderFuelError::Generation(format!("unreadable provider response: {e}")))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FounderFuelError::Generation("provider returned no completion".into()))?;

        debug!(chars = text.chars().count(), "completion received");
        Ok(text)
    }
}
