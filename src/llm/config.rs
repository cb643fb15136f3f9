//! Chat assistant configuration.

use serde::{Deserialize, Serialize};

/// Default system prompt sent ahead of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an intelligent assistant. Answer concisely and helpfully. Keep replies under 200 words unless user asks for more.";

/// Configuration for the streaming chat client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// OpenAI-compatible API base; `/chat/completions` is appended.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token for the chat API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Custom system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Messages kept per conversation, oldest dropped first
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Conversations kept in the local store
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f32 {
    0.6
}

fn default_max_tokens() -> u32 {
    1200
}

fn default_max_history() -> usize {
    40
}

fn default_max_conversations() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            max_history: default_max_history(),
            max_conversations: default_max_conversations(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ChatConfig {
    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DEEPSEEK_API_KEY`: bearer token
    /// - `ANNOBENCH_CHAT_ENDPOINT`: API base
    /// - `ANNOBENCH_CHAT_MODEL`: model name
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("DEEPSEEK_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty_env("ANNOBENCH_CHAT_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = non_empty_env("ANNOBENCH_CHAT_MODEL") {
            self.model = model;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Get the system prompt, using custom or default.
    pub fn get_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
