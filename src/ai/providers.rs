//! Chat-completion capability.
//!
//! `ChatClient` is the seam the prompt runner and AI hotstrings call through;
//! `OpenAiProvider` is the production implementation over ureq.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use super::config::ProviderConfig;

/// OpenAI API constants
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// A blocking chat-completion call.
pub trait ChatClient: Send + Sync {
    /// Send one user message, optionally preceded by a system instruction,
    /// and return the assistant's reply.
    fn chat(&self, system: Option<&str>, user: &str, temperature: f32) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiProvider {
    config: ProviderConfig,
    agent: ureq::Agent,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Self { config, agent }
    }

    /// Full endpoint URL (uses custom base_url if set)
    fn api_url(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_BASE_URL)
            .trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

/// Build the request body. The system message is omitted when absent.
pub(crate) fn build_request_body(
    model: &str,
    system: Option<&str>,
    user: &str,
    temperature: f32,
) -> serde_json::Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(serde_json::json!({ "role": "system", "content": system }));
    }
    messages.push(serde_json::json!({ "role": "user", "content": user }));

    serde_json::json!({
        "model": model,
        "temperature": temperature,
        "messages": messages
    })
}

/// Pull `choices[0].message.content` out of a response.
pub(crate) fn extract_content(response: &serde_json::Value) -> String {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string()
}

impl ChatClient for OpenAiProvider {
    fn chat(&self, system: Option<&str>, user: &str, temperature: f32) -> Result<String> {
        let api_key = self.config.api_key().ok_or_else(|| {
            anyhow!(
                "no API key configured (set {} or {})",
                super::config::env_vars::AI_HUB_OPENAI_API_KEY,
                super::config::env_vars::OPENAI_API_KEY
            )
        })?;

        let body = build_request_body(&self.config.model, system, user, temperature);

        tracing::debug!(
            model = %self.config.model,
            temperature,
            has_system = system.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .agent
            .post(&self.api_url())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", api_key))
            .send_json(&body)
            .context("Failed to send chat completion request")?;

        let response_json: serde_json::Value = response
            .into_body()
            .read_json()
            .context("Failed to parse chat completion response")?;

        let content = extract_content(&response_json);

        tracing::debug!(content_len = content.len(), "Received chat completion");

        Ok(content)
    }
}
