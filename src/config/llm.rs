// src/config/llm.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "o4-mini-deep-research".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    600
}

/// `[llm]` table of `config/radar.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "openai" is supported (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY at client construction.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Deep-research calls can take minutes.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub(crate) fn normalize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    /// Resolve the API key, reading the environment when configured as "ENV".
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        if !self.api_key.trim().eq_ignore_ascii_case("env") {
            return Ok(self.api_key.trim().to_string());
        }
        match self.provider.as_str() {
            "openai" => env::var(ENV_OPENAI_API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing {ENV_OPENAI_API_KEY} env var")),
            other => anyhow::bail!("Unsupported provider in config: {other}"),
        }
    }

    /// Length of the resolved key, for safe diagnostics.
    pub fn key_len(&self) -> usize {
        self.resolve_api_key().map(|k| k.len()).unwrap_or(0)
    }
}
