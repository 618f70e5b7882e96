//! News radar service: binary entrypoint.
//! Boots the Axum HTTP server, the metrics endpoint and the periodic
//! research scheduler.

use news_radar::{
    build_state, init_tracing, metrics::Metrics, research, router,
    scheduler::{spawn_update_scheduler, SchedulerCfg},
    RadarConfig,
};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = RadarConfig::load()?;
    let scheduler_cfg = SchedulerCfg {
        interval_secs: cfg.update_interval_secs,
    };
    tracing::info!(
        countries = cfg.countries.len(),
        industries = cfg.industries.len(),
        window_days = cfg.window_days,
        interval_secs = cfg.update_interval_secs,
        "config loaded"
    );

    let client = research::build_client(&cfg.llm);
    let state = build_state(cfg, client)?;
    let metrics = Metrics::init()?;

    // Detached; lives as long as the runtime.
    let _scheduler = spawn_update_scheduler(scheduler_cfg, state.updater.clone());

    let router = router(state).merge(metrics.router());
    Ok(router.into())
}
