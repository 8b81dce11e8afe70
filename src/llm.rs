use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Context-size variant of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Small,
    Large,
}

impl ModelTier {
    pub fn max_tokens(&self) -> u32 {
        match self {
            ModelTier::Small => 2048,
            ModelTier::Large => 4096,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// The request exceeded the context window of the selected model.
    #[error("request too large for model context: {0}")]
    ContextLength(String),

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM response had no message content")]
    EmptyResponse,
}

/// A chat model the agent can talk to.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[Message], tier: ModelTier) -> Result<String, LlmError>;
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    large_model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl LlmClient {
    pub fn from_env() -> Result<Self> {
        let base_url = dotenv::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = dotenv::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        let large_model =
            dotenv::var("LLM_LARGE_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo-16k".to_string());
        let api_key = dotenv::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());
        let temperature = match dotenv::var("LLM_TEMPERATURE") {
            Ok(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("LLM_TEMPERATURE is not a number: {raw}"))?,
            Err(_) => 0.15,
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            model,
            large_model,
            api_key,
            temperature,
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Small => &self.model,
            ModelTier::Large => &self.large_model,
        }
    }
}

/// Whether an error body describes an oversized request.
fn is_context_length_error(status: u16, body: &str) -> bool {
    if status == 413 {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("context_length_exceeded")
        || lower.contains("maximum context length")
        || lower.contains("too many tokens")
}

#[async_trait]
impl ChatModel for LlmClient {
    /// Non-streaming chat completion.
    async fn chat(&self, messages: &[Message], tier: ModelTier) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model_for(tier),
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": tier.max_tokens(),
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            if is_context_length_error(status.as_u16(), &text) {
                return Err(LlmError::ContextLength(text));
            }
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let json: serde_json::Value = serde_json::from_str(&text).map_err(|_| LlmError::Status {
            status: status.as_u16(),
            body: text.clone(),
        })?;

        // Extract content from choices[0].message.content (handle null)
        json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .map(|s| s.to_string())
            .ok_or(LlmError::EmptyResponse)
    }
}
