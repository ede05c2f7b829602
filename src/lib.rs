pub mod analyzer;
pub mod clock;
pub mod config;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod settings;
pub mod state;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{
    analyze_handler, get_api_key_handler, health_handler, metrics_handler, put_api_key_handler,
    usage_handler,
};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route(
            "/api/settings/api-key",
            get(get_api_key_handler).put(put_api_key_handler),
        )
        .route("/api/usage", get(usage_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
