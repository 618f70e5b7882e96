//! # Data model
//! Records produced by the parser, stamped records kept in the history ledger,
//! and the derived per-country views served to the dashboard.
//!
//! All types serialize as camelCase JSON, which is also the shape of the
//! optional seed document (see `seed.rs`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One item extracted from the model's answer, before it is attached to a
/// country and stamped with an ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    pub industry: Option<String>,
    pub headline: String,
    #[serde(default)]
    pub link: String,
    pub effect: Option<String>,
    /// Raw value from the model. May be out of [1,10]; clamped at aggregation.
    pub positivity_score: Option<f64>,
    pub importance_score: Option<f64>,
    pub source: Option<String>,
    pub published_date: Option<String>,
}

/// A record in the append-only history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub country: String,
    #[serde(default)]
    pub industry: Option<String>,
    // `newsTitle` / `timeGenerated` are the field names of older snapshots.
    #[serde(alias = "newsTitle")]
    pub headline: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub positivity_score: Option<f64>,
    #[serde(default)]
    pub importance_score: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(alias = "timeGenerated")]
    pub ingested_at: DateTime<Utc>,
}

impl NewsRecord {
    pub fn stamp(country: &str, parsed: ParsedRecord, ingested_at: DateTime<Utc>) -> Self {
        Self {
            country: country.to_string(),
            industry: parsed.industry,
            headline: parsed.headline,
            link: parsed.link,
            effect: parsed.effect,
            positivity_score: parsed.positivity_score,
            importance_score: parsed.importance_score,
            source: parsed.source,
            published_date: parsed.published_date,
            ingested_at,
        }
    }
}

/// Per-industry aggregate. `{0, 0, 0}` means "no data" and must never be
/// read as a real low score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryScore {
    pub positivity_score: f64,
    pub importance_score: f64,
    pub average_score: f64,
}

impl IndustryScore {
    pub const NO_DATA: IndustryScore = IndustryScore {
        positivity_score: 0.0,
        importance_score: 0.0,
        average_score: 0.0,
    };

    pub fn has_data(&self) -> bool {
        self.average_score > 0.0
    }
}

/// Derived, disposable summary of one country. Rebuilt on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryView {
    pub name: String,
    pub last_updated: DateTime<Utc>,
    pub overall_score: f64,
    pub industry_scores: BTreeMap<String, IndustryScore>,
    #[serde(default)]
    pub records_by_industry: BTreeMap<String, Vec<NewsRecord>>,
    #[serde(default)]
    pub news_count: usize,
}

/// Whole-store read model; also the seed document format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub countries: BTreeMap<String, CountryView>,
    #[serde(default)]
    pub news_history: Vec<NewsRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySummary {
    pub name: String,
    pub overall_score: f64,
    pub news_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCountry {
    pub name: String,
    pub score: f64,
}

/// Dashboard summary: totals plus the best-scoring countries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub total_countries: usize,
    pub total_news_items: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub countries: Vec<CountrySummary>,
    pub top_countries: Vec<RankedCountry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_history_fields_deserialize() {
        let raw = r#"{
            "timeGenerated": "2024-06-01T10:00:00Z",
            "country": "US",
            "newsTitle": "Retail sales jump",
            "industry": "retail",
            "link": "",
            "effect": "More ad spend",
            "positivityScore": 8,
            "importanceScore": 7
        }"#;
        let rec: NewsRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.headline, "Retail sales jump");
        assert_eq!(rec.positivity_score, Some(8.0));
        assert_eq!(rec.published_date, None);
    }

    #[test]
    fn camel_case_on_the_wire() {
        let s = IndustryScore {
            positivity_score: 7.0,
            importance_score: 8.0,
            average_score: 7.8,
        };
        let v = serde_json::to_value(s).unwrap();
        assert!(v.get("averageScore").is_some());
        assert!(!IndustryScore::NO_DATA.has_data());
    }
}
