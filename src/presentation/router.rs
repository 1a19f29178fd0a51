use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_daily_summary, get_samples, health_check};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/weather/summaries", get(get_samples))
        .route("/api/weather/daily-summary", get(get_daily_summary))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
