//! Update orchestration: prompt → research client → parser → store.
//!
//! Every mutating operation goes through one `tokio::sync::Mutex`, so update
//! runs and alias cleanup never interleave. The slow parts (LLM call, parsing)
//! run without the store lock; the write lock is held only for the append.
//! A failed run leaves the store untouched.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::analyze::aliases::AliasTable;
use crate::analyze::{build_prompt, parse_response_with_stats, PromptVars};
use crate::config::RadarConfig;
use crate::metrics::{
    LAST_UPDATE_TS, PARSE_MS, RECORDS_DROPPED_TOTAL, RECORDS_PARSED_TOTAL, UPDATES_TOTAL,
    UPDATE_FAILURES_TOTAL,
};
use crate::model::ParsedRecord;
use crate::research::DynResearchClient;
use crate::store::StoreHandle;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("research request failed: {0:#}")]
    Upstream(anyhow::Error),
    #[error("research model returned an empty answer")]
    EmptyResponse,
    #[error("an update is already running")]
    Busy,
}

/// Optional overrides for one run. Custom industries only change the prompt;
/// aggregation always uses the configured list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub regions: Option<Vec<String>>,
    pub industries: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub updated_at: DateTime<Utc>,
    pub records: usize,
    pub dropped: usize,
    pub countries: BTreeMap<String, Vec<ParsedRecord>>,
}

pub struct Updater {
    store: StoreHandle,
    client: DynResearchClient,
    countries: Vec<String>,
    industries: Vec<String>,
    lookback_days: u32,
    aliases: AliasTable,
    gate: Mutex<()>,
}

impl Updater {
    pub fn new(store: StoreHandle, client: DynResearchClient, cfg: &RadarConfig) -> Self {
        Self {
            store,
            client,
            countries: cfg.countries.clone(),
            industries: cfg.industries.clone(),
            lookback_days: cfg.lookback_days,
            aliases: cfg.alias_table(),
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn client_name(&self) -> &'static str {
        self.client.name()
    }

    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// One full research round. Returns [`UpdateError::Busy`] immediately if
    /// another mutating operation holds the gate.
    pub async fn run_update(&self, req: UpdateRequest) -> Result<UpdateReport, UpdateError> {
        let _gate = self.gate.try_lock().map_err(|_| UpdateError::Busy)?;

        let res = self.run_locked(req).await;
        if let Err(e) = &res {
            counter!(UPDATE_FAILURES_TOTAL).increment(1);
            warn!(target: "radar::update", error = %e, "update failed, store untouched");
        }
        res
    }

    async fn run_locked(&self, req: UpdateRequest) -> Result<UpdateReport, UpdateError> {
        let regions = non_empty_or(req.regions, &self.countries);
        let industries = non_empty_or(req.industries, &self.industries);

        let vars = PromptVars::for_date(
            &regions,
            &industries,
            Utc::now().date_naive(),
            self.lookback_days,
        );
        let prompt = build_prompt(&vars);
        info!(
            target: "radar::update",
            client = self.client.name(),
            regions = regions.len(),
            industries = industries.len(),
            "requesting research"
        );

        let raw = self
            .client
            .research(&prompt)
            .await
            .map_err(UpdateError::Upstream)?;
        if raw.trim().is_empty() {
            return Err(UpdateError::EmptyResponse);
        }

        let started = Instant::now();
        let outcome = parse_response_with_stats(&raw, &self.aliases);
        histogram!(PARSE_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        let now = Utc::now();
        {
            let mut store = self.store.write();
            for (country, records) in &outcome.records {
                store.append_records_at(country, records.clone(), now);
            }
            store.mark_updated(now);
        }

        let records = outcome.record_count();
        counter!(UPDATES_TOTAL).increment(1);
        counter!(RECORDS_PARSED_TOTAL).increment(records as u64);
        counter!(RECORDS_DROPPED_TOTAL).increment(outcome.dropped as u64);
        gauge!(LAST_UPDATE_TS).set(now.timestamp() as f64);

        info!(
            target: "radar::update",
            countries = outcome.records.len(),
            records,
            dropped = outcome.dropped,
            "update applied"
        );

        Ok(UpdateReport {
            updated_at: now,
            records,
            dropped: outcome.dropped,
            countries: outcome.records,
        })
    }

    /// Merge alias countries into their canonical keys.
    pub async fn cleanup_aliases(&self) -> Result<Vec<(String, String)>, UpdateError> {
        let _gate = self.gate.try_lock().map_err(|_| UpdateError::Busy)?;
        let merged = self.store.write().cleanup_aliases();
        info!(target: "radar::update", merged = merged.len(), "alias cleanup done");
        Ok(merged)
    }
}

fn non_empty_or(custom: Option<Vec<String>>, fallback: &[String]) -> Vec<String> {
    match custom {
        Some(v) if v.iter().any(|s| !s.trim().is_empty()) => v
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => fallback.to_vec(),
    }
}
