//! Research client: sends the prompt to the LLM and returns its raw answer.
//!
//! * `RADAR_TEST_MODE=mock` → [`FixtureClient`] with a canned answer.
//! * `llm.enabled = false` or no API key → [`DisabledClient`] (every call fails).
//! * otherwise → [`OpenAiResearchClient`] (Responses API + web search tool).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LlmConfig;

pub const ENV_TEST_MODE: &str = "RADAR_TEST_MODE";
const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

#[async_trait]
pub trait ResearchClient: Send + Sync {
    /// Raw free-text answer for `prompt`.
    async fn research(&self, prompt: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynResearchClient = Arc<dyn ResearchClient>;

/// Build a client according to config and environment.
pub fn build_client(cfg: &LlmConfig) -> DynResearchClient {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        info!("research client: mock fixture");
        return Arc::new(FixtureClient::new(MOCK_RESPONSE));
    }

    if !cfg.enabled {
        info!("research client: disabled in config");
        return Arc::new(DisabledClient);
    }

    match cfg.provider.as_str() {
        "openai" => match OpenAiResearchClient::from_config(cfg) {
            Ok(c) => {
                info!(model = %cfg.model, key_len = cfg.key_len(), "research client: openai");
                Arc::new(c)
            }
            Err(e) => {
                warn!(error = %e, "research client unavailable, updates will fail");
                Arc::new(DisabledClient)
            }
        },
        other => {
            warn!(provider = other, "unsupported research provider");
            Arc::new(DisabledClient)
        }
    }
}

// ------------------------------------------------------------
// OpenAI Responses API
// ------------------------------------------------------------

pub struct OpenAiResearchClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ResponsesReq<'a> {
    model: &'a str,
    input: &'a str,
    tools: Vec<Tool>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesResp {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl OpenAiResearchClient {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = cfg.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-radar/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            url: OPENAI_RESPONSES_URL.to_string(),
        })
    }

    /// Point at a different endpoint (proxy or local stub).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ResearchClient for OpenAiResearchClient {
    async fn research(&self, prompt: &str) -> Result<String> {
        let req = ResponsesReq {
            model: &self.model,
            input: prompt,
            tools: vec![Tool {
                kind: "web_search_preview",
            }],
        };

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("sending research request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            bail!("research request failed with {status}: {snippet}");
        }

        let body: ResponsesResp = resp.json().await.context("decoding research response")?;
        Ok(output_text(&body))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Concatenate all `output_text` parts, like the SDK's `output_text` helper.
fn output_text(resp: &ResponsesResp) -> String {
    resp.output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter(|part| part.kind == "output_text")
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

// ------------------------------------------------------------
// Fixture + disabled
// ------------------------------------------------------------

/// Returns the same text for every prompt.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    text: String,
}

impl FixtureClient {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ResearchClient for FixtureClient {
    async fn research(&self, _prompt: &str) -> Result<String> {
        Ok(self.text.clone())
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Always fails; used when no provider is configured.
pub struct DisabledClient;

#[async_trait]
impl ResearchClient for DisabledClient {
    async fn research(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("research client is disabled"))
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned answer for `RADAR_TEST_MODE=mock`.
pub const MOCK_RESPONSE: &str = r#"Country: US
Industry: retail
News headline (with links and date): "Holiday retail sales forecast raised" (Reuters, 2024-06-03) [Read more](https://www.reuters.com/markets/us/holiday-retail-forecast)
How does it affect the advertising business: Retailers plan larger seasonal ad budgets.
Positivity score (10 being very positive for the business, 1 being very negative for the business): 8
Importance score (10 being very important for the business, 1 being very unimportant for the business): 7

Country: Europe
Industry: clothing/apparel
News headline (with links and date): "Apparel demand softens across the eurozone" (Financial Times, 2024-06-02) [FT](https://www.ft.com/content/eurozone-apparel)
How does it affect the advertising business: Brands trim performance campaigns.
Positivity score (10 being very positive for the business, 1 being very negative for the business): 3
Importance score (10 being very important for the business, 1 being very unimportant for the business): 6
"#;
