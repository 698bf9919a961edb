//! API request handlers
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or an [`ApiError`].
//! Dashboard endpoints answer 503 until the refresh loop completes its first tick.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::envelope::{ApiError, ApiResponse};
use crate::config::defaults::RAW_FEED_ROWS;
use crate::config::{ConfigError, ConfigHandle, ConfigUpdate, MonitorConfig, ValidationWarning};
use crate::pipeline::{AppState, SystemStatus};
use crate::types::{
    AlertRecord, DashboardSnapshot, DataSource, Kpis, Reading, RiskBand, RiskBreakdown, Severity,
    ZoneMapPoint, ZoneRiskRow,
};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Application state from the refresh loop
    pub app_state: Arc<RwLock<AppState>>,
    /// Runtime configuration
    pub config: ConfigHandle,
    /// File the config was loaded from, if any (enables reload)
    pub config_path: Option<PathBuf>,
}

impl DashboardState {
    pub fn new(app_state: Arc<RwLock<AppState>>, config: ConfigHandle) -> Self {
        Self {
            app_state,
            config,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    async fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.app_state.read().await.latest.clone()
    }
}

fn not_ready() -> Response {
    ApiError::NotReady.into_response()
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: SystemStatus,
    pub site: String,
    pub uptime_secs: u64,
    pub ticks: u64,
    pub fallback_ticks: u64,
    pub last_tick_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub risk: u8,
    pub band: RiskBand,
    pub severity: Severity,
    pub kpis: Kpis,
    pub breakdown: RiskBreakdown,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub zones: Vec<ZoneRiskRow>,
    pub map: Vec<ZoneMapPoint>,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub severity: Severity,
    pub alerts: Vec<AlertRecord>,
    pub latest: Reading,
    pub previous: Reading,
}

#[derive(Debug, Serialize)]
pub struct ReadingsResponse {
    pub data_source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub window_len: usize,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Serialize)]
pub struct ConfigUpdateResponse {
    pub config: MonitorConfig,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Serialize)]
pub struct ConfigValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// ============================================================================
// Dashboard endpoints
// ============================================================================

/// GET /api/v1/health - liveness and tick counters
pub async fn get_health(State(state): State<DashboardState>) -> Response {
    let app = state.app_state.read().await;
    ApiResponse::ok(HealthResponse {
        status: app.status,
        site: app.site_name.clone(),
        uptime_secs: app.uptime_secs(),
        ticks: app.ticks,
        fallback_ticks: app.fallback_ticks,
        last_tick_time: app.last_tick_time,
    })
}

/// GET /api/v1/snapshot - full result of the latest tick
pub async fn get_snapshot(State(state): State<DashboardState>) -> Response {
    match state.latest().await {
        Some(snapshot) => ApiResponse::ok(snapshot.as_ref()),
        None => not_ready(),
    }
}

/// GET /api/v1/risk
pub async fn get_risk(State(state): State<DashboardState>) -> Response {
    let Some(s) = state.latest().await else {
        return not_ready();
    };
    ApiResponse::ok(RiskResponse {
        risk: s.breakdown.risk,
        band: s.risk_band,
        severity: s.severity,
        kpis: s.kpis,
        breakdown: s.breakdown,
        computed_at: s.computed_at,
    })
}

/// GET /api/v1/zones - ranked zone table plus grid layout
pub async fn get_zones(State(state): State<DashboardState>) -> Response {
    let Some(s) = state.latest().await else {
        return not_ready();
    };
    ApiResponse::ok(ZonesResponse {
        zones: s.zones.clone(),
        map: s.zone_map.clone(),
    })
}

/// GET /api/v1/alerts
pub async fn get_alerts(State(state): State<DashboardState>) -> Response {
    let Some(s) = state.latest().await else {
        return not_ready();
    };
    ApiResponse::ok(AlertsResponse {
        severity: s.severity,
        alerts: s.alerts.clone(),
        latest: s.latest,
        previous: s.previous,
    })
}

/// GET /api/v1/readings?limit=24 - newest `limit` readings of the window, oldest first
pub async fn get_readings(
    State(state): State<DashboardState>,
    Query(q): Query<LimitQuery>,
) -> Response {
    let Some(s) = state.latest().await else {
        return not_ready();
    };
    let limit = q.limit.unwrap_or(RAW_FEED_ROWS).min(s.window.len());
    let start = s.window.len() - limit;
    ApiResponse::ok(ReadingsResponse {
        data_source: s.data_source,
        fallback_reason: s.fallback_reason.clone(),
        window_len: s.window.len(),
        readings: s.window[start..].to_vec(),
    })
}

// ============================================================================
// Config endpoints
// ============================================================================

/// GET /api/v1/config
pub async fn get_config(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(state.config.load().as_ref())
}

/// POST /api/v1/config - apply a partial update; takes effect on the next tick
pub async fn update_config(
    State(state): State<DashboardState>,
    Json(update): Json<ConfigUpdate>,
) -> Response {
    match state.config.update(&update) {
        Ok((config, warnings)) => {
            for w in &warnings {
                tracing::warn!("{}", w);
            }
            ApiResponse::ok(ConfigUpdateResponse {
                config: (*config).clone(),
                warnings,
            })
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /api/v1/config/validate - dry run of an update, nothing is applied
pub async fn validate_config(
    State(state): State<DashboardState>,
    Json(update): Json<ConfigUpdate>,
) -> Response {
    let response = match state.config.load().apply_update(&update) {
        Ok((_, warnings)) => ConfigValidationResponse {
            valid: true,
            errors: Vec::new(),
            warnings,
        },
        Err(ConfigError::Validation(errors)) => ConfigValidationResponse {
            valid: false,
            errors,
            warnings: Vec::new(),
        },
        Err(e) => ConfigValidationResponse {
            valid: false,
            errors: vec![e.to_string()],
            warnings: Vec::new(),
        },
    };
    ApiResponse::ok(response)
}

/// POST /api/v1/config/reload - re-read the config file from disk
pub async fn reload_config(State(state): State<DashboardState>) -> Response {
    let Some(path) = state.config_path.as_ref() else {
        return ApiError::BadRequest(
            "Running on built-in defaults: no config file to reload".to_string(),
        )
        .into_response();
    };
    match state.config.reload_from(path) {
        Ok(config) => ApiResponse::ok(config.as_ref()),
        Err(e) => {
            tracing::warn!(error = %e, "Config reload via API failed");
            ApiError::from(e).into_response()
        }
    }
}
