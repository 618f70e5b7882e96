use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const UPDATES_TOTAL: &str = "radar_updates_total";
pub const UPDATE_FAILURES_TOTAL: &str = "radar_update_failures_total";
pub const RECORDS_PARSED_TOTAL: &str = "radar_records_parsed_total";
pub const RECORDS_DROPPED_TOTAL: &str = "radar_records_dropped_total";
pub const LAST_UPDATE_TS: &str = "radar_last_update_ts";
pub const PARSE_MS: &str = "radar_parse_ms";

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. The recorder is process-global, so
    /// repeated calls (tests) share the first handle.
    pub fn init() -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")?;
                describe();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(UPDATES_TOTAL, "Successful update runs");
    describe_counter!(UPDATE_FAILURES_TOTAL, "Failed update runs");
    describe_counter!(RECORDS_PARSED_TOTAL, "Records extracted from model answers");
    describe_counter!(RECORDS_DROPPED_TOTAL, "Record blocks dropped for lack of a headline");
    describe_gauge!(LAST_UPDATE_TS, "Unix time of the last successful update");
    describe_histogram!(PARSE_MS, "Response parsing time in milliseconds");
}
