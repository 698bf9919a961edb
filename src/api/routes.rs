//! API route definitions
//!
//! Organizes endpoints for the flood-risk dashboard:
//! - /api/v1/health - Liveness and tick counters
//! - /api/v1/snapshot - Full latest tick
//! - /api/v1/risk, /zones, /alerts, /readings - Dashboard panels
//! - /api/v1/config - Runtime design parameters and thresholds

use axum::{routing::{get, post}, Router};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/risk", get(handlers::get_risk))
        .route("/zones", get(handlers::get_zones))
        .route("/alerts", get(handlers::get_alerts))
        .route("/readings", get(handlers::get_readings))
        // Runtime configuration
        .route("/config", get(handlers::get_config).post(handlers::update_config))
        .route("/config/validate", post(handlers::validate_config))
        .route("/config/reload", post(handlers::reload_config))
        .with_state(state)
}
