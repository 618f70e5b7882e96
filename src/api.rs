//! HTTP API for the dashboard.
//!
//! Every response uses the same envelope:
//! `{ "success": true, "data": ..., "message": ... }` or
//! `{ "success": false, "error": ..., "message": ... }`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::RadarConfig;
use crate::store::StoreHandle;
use crate::update::{UpdateError, UpdateRequest, Updater};

const TOP_COUNTRIES: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub updater: Arc<Updater>,
    pub config: Arc<RadarConfig>,
    pub started: Instant,
}

impl AppState {
    pub fn new(updater: Arc<Updater>, config: Arc<RadarConfig>) -> Self {
        Self {
            store: updater.store().clone(),
            updater,
            config,
            started: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/news", get(all_news))
        .route("/api/news/update", post(trigger_update))
        .route("/api/news/{country}", get(country_news))
        .route("/api/news/{country}/history", get(country_history))
        .route("/api/admin/cleanup-aliases", post(cleanup_aliases))
        .route("/api/regions", get(regions))
        .route("/api/industries", get(industries))
        .route("/api/summary", get(summary))
        .route("/api/status", get(status))
        .route("/api/docs", get(docs))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::very_permissive();
    }
    let allowed = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect::<Vec<_>>();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

// ------------------------------------------------------------
// Envelope
// ------------------------------------------------------------

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    data: T,
    message: String,
}

fn ok<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    Json(Envelope {
        success: true,
        data,
        message: message.into(),
    })
    .into_response()
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.error,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<UpdateError> for ApiError {
    fn from(e: UpdateError) -> Self {
        let status = match e {
            UpdateError::Busy => StatusCode::CONFLICT,
            UpdateError::Upstream(_) | UpdateError::EmptyResponse => StatusCode::BAD_GATEWAY,
        };
        ApiError::new(status, e.to_string(), "News update failed")
    }
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

async fn health() -> Response {
    ok(
        json!({ "status": "ok", "timestamp": Utc::now() }),
        "Server is running",
    )
}

async fn all_news(State(state): State<AppState>) -> Response {
    let snapshot = state.store.read().snapshot();
    ok(snapshot, "News data retrieved successfully")
}

async fn country_news(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<Response, ApiError> {
    let view = state.store.read().country_view(&country).cloned();
    match view {
        Some(v) => Ok(ok(v, format!("News data for {country} retrieved successfully"))),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("No data found for country: {country}"),
            "Unknown country",
        )),
    }
}

async fn country_history(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Response {
    let history = state.store.read().history_for(&country);
    ok(
        json!({ "country": country, "history": history }),
        format!("News history for {country} retrieved successfully"),
    )
}

async fn trigger_update(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let req: UpdateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        UpdateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, e.to_string(), "Invalid update request")
        })?
    };

    info!(target: "radar::api", "manual update requested");
    let report = state.updater.run_update(req).await.map_err(|e| {
        warn!(target: "radar::api", error = %e, "manual update failed");
        ApiError::from(e)
    })?;
    Ok(ok(report, "News data updated successfully"))
}

async fn cleanup_aliases(State(state): State<AppState>) -> Result<Response, ApiError> {
    let merged = state.updater.cleanup_aliases().await?;
    let merged = merged
        .into_iter()
        .map(|(alias, canonical)| json!({ "alias": alias, "canonical": canonical }))
        .collect::<Vec<_>>();
    Ok(ok(merged, "Country aliases cleaned up"))
}

async fn regions(State(state): State<AppState>) -> Response {
    ok(&state.config.countries, "Available regions retrieved successfully")
}

async fn industries(State(state): State<AppState>) -> Response {
    ok(&state.config.industries, "Available industries retrieved successfully")
}

async fn summary(State(state): State<AppState>) -> Response {
    let summary = state.store.read().summary(TOP_COUNTRIES);
    ok(summary, "Data summary retrieved successfully")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOut {
    server: ServerStatus,
    data: DataStatus,
    research: ResearchStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerStatus {
    status: &'static str,
    timestamp: chrono::DateTime<Utc>,
    uptime_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataStatus {
    has_data: bool,
    last_updated: Option<chrono::DateTime<Utc>>,
    countries_count: usize,
    total_news_items: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResearchStatus {
    client: &'static str,
    model: String,
    key_length: usize,
    update_running: bool,
    update_interval_secs: u64,
}

async fn status(State(state): State<AppState>) -> Response {
    let data = {
        let store = state.store.read();
        DataStatus {
            has_data: store.last_updated().is_some(),
            last_updated: store.last_updated(),
            countries_count: store.all_views().len(),
            total_news_items: store.history().len(),
        }
    };
    let out = StatusOut {
        server: ServerStatus {
            status: "running",
            timestamp: Utc::now(),
            uptime_secs: state.started.elapsed().as_secs(),
        },
        data,
        research: ResearchStatus {
            client: state.updater.client_name(),
            model: state.config.llm.model.clone(),
            key_length: state.config.llm.key_len(),
            update_running: state.updater.is_running(),
            update_interval_secs: state.config.update_interval_secs,
        },
    };
    ok(out, "Server status retrieved successfully")
}

async fn docs() -> Response {
    let endpoints: BTreeMap<&str, &str> = [
        ("GET /api/health", "Server health check"),
        ("GET /api/news", "All country views and the news history"),
        ("GET /api/news/{country}", "View of one country"),
        ("GET /api/news/{country}/history", "Full news history of one country"),
        ("POST /api/news/update", "Trigger a research update; optional body {regions, industries}"),
        ("POST /api/admin/cleanup-aliases", "Merge alias countries into canonical ones"),
        ("GET /api/regions", "Configured regions"),
        ("GET /api/industries", "Configured industries"),
        ("GET /api/summary", "Totals and top countries by score"),
        ("GET /api/status", "Server, data and research client status"),
        ("GET /metrics", "Prometheus metrics"),
    ]
    .into_iter()
    .collect();

    ok(
        json!({
            "endpoints": endpoints,
            "dataStructure": {
                "snapshot": {
                    "lastUpdated": "ISO timestamp or null",
                    "countries": "Map of country name to country view",
                    "newsHistory": "Array of all ingested news records"
                },
                "countryView": {
                    "name": "Country name",
                    "lastUpdated": "ISO timestamp",
                    "overallScore": "Number in [1, 10], 5 when there is no data",
                    "industryScores": "Map of industry to {positivityScore, importanceScore, averageScore}; zeros mean no data",
                    "recordsByIndustry": "Map of industry to records inside the window",
                    "newsCount": "Records inside the window"
                }
            }
        }),
        "API documentation retrieved successfully",
    )
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "Endpoint not found",
        format!("Route {method} {uri} does not exist"),
    )
}
