// src/lib.rs
// Public library surface for the binary, the replay tool and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod metrics;
pub mod model;
pub mod research;
pub mod scheduler;
pub mod seed;
pub mod store;
pub mod update;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::RadarConfig;
pub use crate::store::{CountryStore, StoreHandle};
pub use crate::update::{UpdateError, UpdateRequest, Updater};

use std::sync::Arc;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::research::DynResearchClient;

pub const ENV_LOG_JSON: &str = "RADAR_LOG_JSON";

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter; `RADAR_LOG_JSON=1` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_radar=info,radar=info,warn"));
    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Store (seeded when configured) + updater for `cfg`, using `client` for research.
pub fn build_state(cfg: RadarConfig, client: DynResearchClient) -> anyhow::Result<AppState> {
    let mut store = CountryStore::new(cfg.store_policy());
    seed::seed_store(&mut store, cfg.seed_path.as_deref())?;

    let store = StoreHandle::new(store);
    let updater = Arc::new(Updater::new(store, client, &cfg));
    Ok(AppState::new(updater, Arc::new(cfg)))
}

/// Full in-process app from config + environment, including `/metrics`.
/// The background scheduler is not started here; see `main.rs`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = RadarConfig::load()?;
    let client = crate::research::build_client(&cfg.llm);
    let state = build_state(cfg, client)?;
    let metrics = crate::metrics::Metrics::init()?;
    Ok(router(state).merge(metrics.router()))
}
