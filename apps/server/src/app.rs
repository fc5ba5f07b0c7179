//! Router construction and shared application state.

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use founderfuel_core::Services;

use crate::routes;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

/// Build the application router with CORS restricted to `allowed_origins`.
pub fn build_router(services: Services, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/scrape", post(routes::scrape))
        .route("/api/history", get(routes::scrape_history))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/analyses", get(routes::analysis_history))
        .route("/api/repurpose", post(routes::repurpose))
        .route("/api/repurpose/history", get(routes::repurpose_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { services })
}
