mod analyze;
mod health;
mod metrics;
mod settings;

use axum::{Json, http::StatusCode};

pub use analyze::analyze_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use settings::{get_api_key_handler, put_api_key_handler, usage_handler};

// JSON error body shared by the handlers
pub type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}
