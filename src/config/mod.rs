// src/config/mod.rs
//! Service configuration: `config/radar.toml` plus environment overrides.
//!
//! Resolution order for the file:
//! 1) $RADAR_CONFIG_PATH (must exist)
//! 2) config/radar.toml
//! 3) built-in defaults
//!
//! Then `RADAR_WINDOW_DAYS`, `RADAR_UPDATE_INTERVAL_SECS` and
//! `RADAR_SEED_PATH` override the file values.

pub mod llm;

pub use llm::LlmConfig;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::aliases::AliasTable;
use crate::store::StorePolicy;

pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const ENV_WINDOW_DAYS: &str = "RADAR_WINDOW_DAYS";
pub const ENV_UPDATE_INTERVAL_SECS: &str = "RADAR_UPDATE_INTERVAL_SECS";
pub const ENV_SEED_PATH: &str = "RADAR_SEED_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/radar.toml";

pub const DEFAULT_WINDOW_DAYS: u32 = 14;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Upper bound for `window_days` and `lookback_days` (ten years).
pub const MAX_WINDOW_DAYS: u32 = 3650;
/// Every six hours.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 6 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Regions requested from the model, in prompt order.
    pub countries: Vec<String>,
    pub industries: Vec<String>,
    /// Aggregation window of the store.
    pub window_days: u32,
    /// How far back the model may look for articles.
    pub lookback_days: u32,
    /// 0 disables the background scheduler.
    pub update_interval_secs: u64,
    /// Extra `canonical = [aliases]` groups on top of the built-in ones.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
    pub seed_path: Option<PathBuf>,
    pub llm: LlmConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            countries: to_strings(&["US", "Europe", "Australia", "South Korea"]),
            industries: to_strings(&[
                "Beauty/wellness",
                "clothing/apparel",
                "retail",
                "ticketing/events",
            ]),
            window_days: DEFAULT_WINDOW_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            aliases: BTreeMap::new(),
            cors_origins: Vec::new(),
            seed_path: None,
            llm: LlmConfig::default(),
        }
    }
}

impl RadarConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: RadarConfig = toml::from_str(s).context("parsing radar config")?;
        cfg.normalize();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading radar config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// File (see module docs) plus env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                tracing::info!("no {DEFAULT_CONFIG_PATH}, using built-in defaults");
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_non_empty(ENV_WINDOW_DAYS) {
            self.window_days = v
                .parse()
                .with_context(|| format!("{ENV_WINDOW_DAYS}={v} is not a day count"))?;
        }
        if let Some(v) = env_non_empty(ENV_UPDATE_INTERVAL_SECS) {
            self.update_interval_secs = v
                .parse()
                .with_context(|| format!("{ENV_UPDATE_INTERVAL_SECS}={v} is not a number"))?;
        }
        if let Some(v) = env_non_empty(ENV_SEED_PATH) {
            self.seed_path = Some(PathBuf::from(v));
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        self.countries = clean_list(std::mem::take(&mut self.countries));
        self.industries = clean_list(std::mem::take(&mut self.industries));
        self.cors_origins = clean_list(std::mem::take(&mut self.cors_origins));
        if self.window_days == 0 {
            self.window_days = DEFAULT_WINDOW_DAYS;
        }
        if self.lookback_days == 0 {
            self.lookback_days = DEFAULT_LOOKBACK_DAYS;
        }
        self.window_days = self.window_days.min(MAX_WINDOW_DAYS);
        self.lookback_days = self.lookback_days.min(MAX_WINDOW_DAYS);
        self.llm.normalize();
    }

    pub fn alias_table(&self) -> AliasTable {
        AliasTable::default_seed().with_groups(&self.aliases)
    }

    pub fn store_policy(&self) -> StorePolicy {
        StorePolicy::new(self.industries.clone(), self.window_days, self.alias_table())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Trim, drop empties, dedup; first occurrence keeps its position.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = RadarConfig::from_toml_str(
            r#"
            countries = [" US ", "Canada", "", "US"]
            window_days = 0

            [aliases]
            Canada = ["CA", "Kanada"]

            [llm]
            model = "gpt-4.1"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.countries, vec!["US".to_string(), "Canada".to_string()]);
        assert_eq!(cfg.industries.len(), 4);
        assert_eq!(cfg.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(cfg.llm.model, "gpt-4.1");
        assert_eq!(cfg.llm.provider, "openai");

        let aliases = cfg.alias_table();
        assert_eq!(aliases.canonical("Kanada"), "Canada");
        assert_eq!(aliases.canonical("USA"), "US");
    }

    #[test]
    fn day_counts_are_capped() {
        let cfg = RadarConfig::from_toml_str(
            r#"
            window_days = 100000
            lookback_days = 4000000000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.window_days, MAX_WINDOW_DAYS);
        assert_eq!(cfg.lookback_days, MAX_WINDOW_DAYS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(RadarConfig::from_toml_str("countries = 3").is_err());
    }

    #[test]
    fn store_policy_carries_window_and_industries() {
        let cfg = RadarConfig::default();
        let p = cfg.store_policy();
        assert_eq!(p.window, chrono::Duration::days(14));
        assert_eq!(p.industries, cfg.industries);
    }
}
