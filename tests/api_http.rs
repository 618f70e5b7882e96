// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with the
// fixture research client so no network is touched.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use news_radar::research::{DisabledClient, DynResearchClient, FixtureClient, MOCK_RESPONSE};
use news_radar::{build_state, router, RadarConfig};

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(client: DynResearchClient) -> Router {
    let state = build_state(RadarConfig::default(), client).expect("build state");
    router(state)
}

fn fixture_router() -> Router {
    test_router(Arc::new(FixtureClient::new(MOCK_RESPONSE)))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Json) {
    let mut req = Request::builder().method(method).uri(uri);
    if body.is_some() {
        req = req.header("content-type", "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json: Json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn health_uses_success_envelope() {
    let app = fixture_router();
    let (status, v) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert!(v["message"].is_string());
    assert_eq!(v["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_country_is_404_with_error_envelope() {
    let app = fixture_router();
    let (status, v) = call(&app, "GET", "/api/news/Atlantis", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["success"], false);
    assert!(v["error"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn update_then_read_country_view() {
    let app = fixture_router();

    let (status, v) = call(&app, "POST", "/api/news/update", None).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["data"]["records"], 2);

    let (status, v) = call(&app, "GET", "/api/news/US", None).await;
    assert_eq!(status, StatusCode::OK);
    let us = &v["data"];
    assert_eq!(us["name"], "US");
    assert!(us["industryScores"]["retail"]["averageScore"].as_f64().unwrap() > 0.0);
    assert_eq!(us["industryScores"]["ticketing/events"]["averageScore"], 0.0);

    let (_, v) = call(&app, "GET", "/api/news/US/history", None).await;
    assert_eq!(v["data"]["country"], "US");
    assert_eq!(v["data"]["history"].as_array().unwrap().len(), 1);

    let (_, v) = call(&app, "GET", "/api/news", None).await;
    assert!(v["data"]["lastUpdated"].is_string());
    assert_eq!(v["data"]["newsHistory"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_accepts_custom_regions_and_rejects_bad_json() {
    let app = fixture_router();

    let (status, _) = call(
        &app,
        "POST",
        "/api/news/update",
        Some(r#"{"regions":["US"],"industries":["retail"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, v) = call(&app, "POST", "/api/news/update", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["success"], false);
}

#[tokio::test]
async fn upstream_failure_is_502_and_store_stays_empty() {
    let app = test_router(Arc::new(DisabledClient));

    let (status, v) = call(&app, "POST", "/api/news/update", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["success"], false);

    let (_, v) = call(&app, "GET", "/api/news", None).await;
    assert!(v["data"]["lastUpdated"].is_null());
    assert!(v["data"]["countries"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn summary_regions_industries_status_docs() {
    let app = fixture_router();
    call(&app, "POST", "/api/news/update", None).await;

    let (_, v) = call(&app, "GET", "/api/summary", None).await;
    assert_eq!(v["data"]["totalCountries"], 2);
    assert!(v["data"]["topCountries"].as_array().unwrap().len() <= 3);

    let (_, v) = call(&app, "GET", "/api/regions", None).await;
    assert_eq!(v["data"].as_array().unwrap().len(), 4);

    let (_, v) = call(&app, "GET", "/api/industries", None).await;
    assert_eq!(v["data"][0], "Beauty/wellness");

    let (_, v) = call(&app, "GET", "/api/status", None).await;
    assert_eq!(v["data"]["data"]["hasData"], true);
    assert_eq!(v["data"]["research"]["client"], "fixture");

    let (status, v) = call(&app, "GET", "/api/docs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["data"]["endpoints"]["GET /api/health"].is_string());
}

#[tokio::test]
async fn cleanup_aliases_endpoint_reports_merges() {
    let app = fixture_router();
    let (status, v) = call(&app, "POST", "/api/admin/cleanup-aliases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = fixture_router();
    let (status, v) = call(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "Endpoint not found");
    assert!(v["message"].as_str().unwrap().contains("/api/nope"));
}
