// src/seed.rs
//! Read-only bootstrap snapshot. Nothing is ever written back.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;

use crate::model::Snapshot;
use crate::store::CountryStore;

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading seed snapshot from {}", path.display()))?;
    let snap: Snapshot = serde_json::from_str(&data)
        .with_context(|| format!("parsing seed snapshot {}", path.display()))?;
    Ok(snap)
}

/// Seed `store` from `path` when given. A missing path is not an error; a
/// present but unreadable or malformed file is.
pub fn seed_store(store: &mut CountryStore, path: Option<&Path>) -> Result<usize> {
    let Some(path) = path else {
        return Ok(0);
    };
    let snap = load_snapshot(path)?;
    let n = snap.news_history.len();
    store.load(snap, Utc::now());
    tracing::info!(
        path = %path.display(),
        records = n,
        countries = store.all_views().len(),
        "store seeded"
    );
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarConfig;
    use std::io::Write;

    #[test]
    fn seeds_views_and_history() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{
                "lastUpdated": "2024-06-01T10:00:00Z",
                "countries": {{}},
                "newsHistory": [{{
                    "country": "US",
                    "industry": "retail",
                    "newsTitle": "Retail sales jump",
                    "positivityScore": 8,
                    "importanceScore": 7,
                    "timeGenerated": "2024-06-01T10:00:00Z"
                }}]
            }}"#
        )
        .unwrap();

        let mut store = CountryStore::new(RadarConfig::default().store_policy());
        let n = seed_store(&mut store, Some(f.path())).unwrap();
        assert_eq!(n, 1);
        assert_eq!(store.history_for("US").len(), 1);
        assert!(store.country_view("US").is_some());
    }

    #[test]
    fn malformed_seed_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let mut store = CountryStore::new(RadarConfig::default().store_policy());
        assert!(seed_store(&mut store, Some(f.path())).is_err());
        assert_eq!(seed_store(&mut store, None).unwrap(), 0);
    }
}
