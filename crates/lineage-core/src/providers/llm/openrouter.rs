use super::{ChatRequest, Completion, LlmClient};
use crate::errors::{ConfigError, ProviderError};
use async_trait::async_trait;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Sent as `HTTP-Referer` for rankings on openrouter.ai.
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    pub title: Option<String>,
}

impl ClientConfig {
    /// Reads `OPENROUTER_API_KEY` (required) and `OPENROUTER_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError("OPENROUTER_API_KEY is not set".into()))?;
        let base_url =
            env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            base_url,
            referer: None,
            title: None,
        })
    }
}

pub struct OpenRouterClient {
    pub config: ClientConfig,
    pub client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Parses a success body into a [`Completion`].
///
/// A missing `content` is an empty answer (scored as missing later); a body
/// without any choice is a decode failure.
pub fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let choice = json.pointer("/choices/0").ok_or_else(|| {
        let msg = json
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .unwrap_or("response has no choices");
        ProviderError::Decode(msg.to_string())
    })?;

    let text = choice
        .pointer("/message/content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let provider = json
        .get("provider")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Completion { text, provider })
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, req: &ChatRequest) -> Result<Completion, ProviderError> {
        let mut builder = self
            .client
            .post(self.url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");
        if let Some(referer) = &self.config.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            builder = builder.header("X-Title", title);
        }

        let resp = builder
            .json(req)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        tracing::debug!(event = "response_status", status = status.as_u16());

        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %body, "error response");
            return Err(ProviderError::from_status(
                status.as_u16(),
                error_message(&body),
            ));
        }

        parse_completion(&body)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
