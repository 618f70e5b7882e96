//! Replay a saved model answer through the parser and the store, then print
//! the resulting views as JSON. No network, no server.
//!
//! Usage: `replay <answer.txt> [--history]`

use anyhow::{bail, Context, Result};
use chrono::Utc;
use news_radar::analyze::parse_response_with_stats;
use news_radar::{init_tracing, CountryStore, RadarConfig};

fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: replay <answer.txt> [--history]");
    };
    let with_history = args.any(|a| a == "--history");

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let cfg = RadarConfig::load()?;

    let outcome = parse_response_with_stats(&raw, &cfg.alias_table());
    tracing::info!(
        countries = outcome.records.len(),
        records = outcome.record_count(),
        dropped = outcome.dropped,
        "parsed"
    );

    let mut store = CountryStore::new(cfg.store_policy());
    let now = Utc::now();
    for (country, records) in outcome.records {
        store.append_records_at(&country, records, now);
    }
    store.mark_updated(now);

    let out = if with_history {
        serde_json::to_string_pretty(&store.snapshot())?
    } else {
        serde_json::to_string_pretty(store.all_views())?
    };
    println!("{out}");
    Ok(())
}
