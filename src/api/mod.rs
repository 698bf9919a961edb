//! REST API module using Axum
//!
//! Provides HTTP endpoints for the flood-risk dashboard under `/api/v1`,
//! each wrapped in the envelope from [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::DashboardState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `DRAINAGE_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for a dashboard served from elsewhere (e.g. `http://localhost:5173`).
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("DRAINAGE_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: DashboardState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
