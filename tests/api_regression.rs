//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`. Snapshots
//! are produced by a real `RefreshLoop` tick over seeded synthetic data, so
//! no binary spawn or network port is needed.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use drainage_monitor::acquisition::{CsvFileSource, ReadingSource, SyntheticConfig, SyntheticSource};
use drainage_monitor::api::{create_app, DashboardState};
use drainage_monitor::config::{ConfigHandle, ConfigOverrides, MonitorConfig};
use drainage_monitor::pipeline::processing_loop::RefreshLoop;
use drainage_monitor::pipeline::AppState;

fn create_test_state() -> DashboardState {
    DashboardState::new(
        Arc::new(RwLock::new(AppState::new("Test Catchment"))),
        ConfigHandle::default(),
    )
}

fn seeded_source() -> Box<dyn ReadingSource> {
    Box::new(SyntheticSource::new(SyntheticConfig {
        seed: Some(21),
        ..SyntheticConfig::default()
    }))
}

/// Run `ticks` refresh ticks from `source` into `state`.
async fn tick(state: &DashboardState, source: Box<dyn ReadingSource>, ticks: usize) {
    let mut refresh = RefreshLoop::new(
        source,
        Arc::clone(&state.app_state),
        state.config.clone(),
        CancellationToken::new(),
    );
    for _ in 0..ticks {
        assert!(refresh.tick_once().await.is_some());
    }
}

async fn send(state: &DashboardState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn get(state: &DashboardState, uri: &str) -> (StatusCode, Value) {
    send(state, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(state: &DashboardState, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(state, request).await
}

// ============================================================================
// Before the first tick
// ============================================================================

#[tokio::test]
async fn test_dashboard_endpoints_unavailable_before_first_tick() {
    let state = create_test_state();

    for uri in [
        "/api/v1/snapshot",
        "/api/v1/risk",
        "/api/v1/zones",
        "/api/v1/alerts",
        "/api/v1/readings",
    ] {
        let (status, body) = get(&state, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE", "{uri}");
    }

    let (status, body) = get(&state, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Initializing");
    assert_eq!(body["data"]["site"], "Test Catchment");
    assert_eq!(body["data"]["ticks"], 0);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = create_test_state();
    let (status, _) = get(&state, "/api/v1/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// After ticks
// ============================================================================

#[tokio::test]
async fn test_dashboard_endpoints_after_tick() {
    let state = create_test_state();
    tick(&state, seeded_source(), 2).await;

    for uri in [
        "/api/v1/health",
        "/api/v1/snapshot",
        "/api/v1/risk",
        "/api/v1/zones",
        "/api/v1/alerts",
        "/api/v1/readings",
        "/api/v1/config",
    ] {
        let (status, body) = get(&state, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["meta"]["version"], "1", "{uri}");
    }

    let (_, health) = get(&state, "/api/v1/health").await;
    assert_eq!(health["data"]["ticks"], 2);
    assert_ne!(health["data"]["status"], "Initializing");

    let (_, risk) = get(&state, "/api/v1/risk").await;
    let score = risk["data"]["risk"].as_u64().unwrap();
    assert!(score <= 100);
    assert_eq!(risk["data"]["kpis"]["risk"], risk["data"]["risk"]);

    let (_, zones) = get(&state, "/api/v1/zones").await;
    assert_eq!(zones["data"]["zones"].as_array().unwrap().len(), 6);
    assert_eq!(zones["data"]["map"].as_array().unwrap().len(), 6);

    let (_, alerts) = get(&state, "/api/v1/alerts").await;
    assert!(!alerts["data"]["alerts"].as_array().unwrap().is_empty());
    assert!(["OK", "WARNING", "CRITICAL"]
        .contains(&alerts["data"]["severity"].as_str().unwrap()));
}

#[tokio::test]
async fn test_readings_limit() {
    let state = create_test_state();
    tick(&state, seeded_source(), 1).await;

    let (_, all) = get(&state, "/api/v1/readings").await;
    assert_eq!(all["data"]["window_len"], 24);
    assert_eq!(all["data"]["readings"].as_array().unwrap().len(), 24);
    assert_eq!(all["data"]["data_source"], "synthetic");

    let (_, five) = get(&state, "/api/v1/readings?limit=5").await;
    let readings = five["data"]["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 5);
    assert_eq!(readings[4], all["data"]["readings"][23]);

    let (_, capped) = get(&state, "/api/v1/readings?limit=500").await;
    assert_eq!(capped["data"]["readings"].as_array().unwrap().len(), 24);
}

#[tokio::test]
async fn test_rejected_csv_reports_fallback() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,rain_mm_per_hr,tank_fill_pct").unwrap();
    writeln!(file, "2026-03-01 00:00:00,1.0,40.0").unwrap();
    file.flush().unwrap();

    let state = create_test_state();
    tick(&state, Box::new(CsvFileSource::new(file.path())), 1).await;

    let (_, readings) = get(&state, "/api/v1/readings").await;
    assert_eq!(readings["data"]["data_source"], "synthetic_fallback");
    assert!(readings["data"]["fallback_reason"]
        .as_str()
        .unwrap()
        .contains("drain_flow_Lps"));

    let (_, health) = get(&state, "/api/v1/health").await;
    assert_eq!(health["data"]["fallback_ticks"], 1);
}

// ============================================================================
// Config endpoints
// ============================================================================

#[tokio::test]
async fn test_config_update_applies_on_next_tick() {
    let state = create_test_state();
    tick(&state, seeded_source(), 1).await;

    let (status, body) = post(
        &state,
        "/api/v1/config",
        json!({ "history_window_hours": 12, "clog_level_pct": 60.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["config"]["design"]["clog_level_pct"], 60.0);
    assert!(body["data"]["warnings"].as_array().unwrap().is_empty());

    let (_, config) = get(&state, "/api/v1/config").await;
    assert_eq!(config["data"]["dashboard"]["history_window_hours"], 12);

    tick(&state, seeded_source(), 1).await;
    let (_, readings) = get(&state, "/api/v1/readings").await;
    assert_eq!(readings["data"]["window_len"], 12);
}

#[tokio::test]
async fn test_config_update_clamps_with_warning() {
    let state = create_test_state();
    let (status, body) = post(&state, "/api/v1/config", json!({ "tank_critical_pct": 40.0 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["config"]["alerts"]["tank_critical_pct"], 70.0);
    assert_eq!(
        body["data"]["warnings"][0]["field"],
        "alerts.tank_critical_pct"
    );
}

#[tokio::test]
async fn test_config_update_rejects_unknown_field() {
    let state = create_test_state();
    let (status, _) = post(&state, "/api/v1/config", json!({ "clog_levle_pct": 10.0 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, config) = get(&state, "/api/v1/config").await;
    assert_eq!(config["data"]["design"]["clog_level_pct"], 18.0);
}

#[tokio::test]
async fn test_config_validate_is_a_dry_run() {
    let state = create_test_state();
    let (status, body) = post(
        &state,
        "/api/v1/config/validate",
        json!({ "storage_capacity_m3": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["warnings"].as_array().unwrap().len(), 1);

    let (_, config) = get(&state, "/api/v1/config").await;
    assert_eq!(config["data"]["design"]["storage_capacity_m3"], 1200.0);
}

#[tokio::test]
async fn test_config_reload() {
    let state = create_test_state();
    let (status, body) = post(&state, "/api/v1/config/reload", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[site]\nname = \"Reloaded Site\"").unwrap();
    file.flush().unwrap();

    let state = create_test_state().with_config_path(file.path());
    let (status, body) = post(&state, "/api/v1/config/reload", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["site"]["name"], "Reloaded Site");
    assert_eq!(state.config.load().site.name, "Reloaded Site");
}

#[tokio::test]
async fn test_config_reload_reports_command_line_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\naddr = \"0.0.0.0:8080\"").unwrap();
    file.flush().unwrap();

    let overrides = ConfigOverrides {
        addr: Some("127.0.0.1:9300".to_string()),
        ..ConfigOverrides::default()
    };
    let state = DashboardState::new(
        Arc::new(RwLock::new(AppState::new("Test Catchment"))),
        ConfigHandle::with_overrides(MonitorConfig::default(), overrides),
    )
    .with_config_path(file.path());

    let (status, _) = post(&state, "/api/v1/config/reload", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, config) = get(&state, "/api/v1/config").await;
    assert_eq!(config["data"]["server"]["addr"], "127.0.0.1:9300");
}
