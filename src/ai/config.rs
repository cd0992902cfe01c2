//! AI provider configuration and API key detection.
//!
//! Keys come from the environment only:
//! - `AI_HUB_OPENAI_API_KEY` (preferred, scoped to this tool)
//! - `OPENAI_API_KEY` (fallback)
//!
//! The key is never written to the config file and never logged.

use std::env;

use crate::config::AiSettings;

/// Environment variable names
pub mod env_vars {
    pub const AI_HUB_OPENAI_API_KEY: &str = "AI_HUB_OPENAI_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
}

/// Resolved settings for the chat-completion provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub model: String,
    /// Base URL for the API (for proxies and compatible servers)
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("has_key", &self.has_valid_key())
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(settings: &AiSettings, api_key: Option<String>) -> Self {
        Self {
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            timeout_secs: settings.timeout_secs,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Build from settings plus whatever key the environment provides.
    pub fn from_environment(settings: &AiSettings) -> Self {
        Self::new(settings, detect_api_key())
    }

    /// Get the API key for making requests. Never log the returned value.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_valid_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// First non-empty key among the supported environment variables.
pub fn detect_api_key() -> Option<String> {
    [env_vars::AI_HUB_OPENAI_API_KEY, env_vars::OPENAI_API_KEY]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
