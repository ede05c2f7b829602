use axum::http::StatusCode;
use tracing::warn;

use super::{ApiError, api_error};

pub async fn metrics_handler() -> Result<String, ApiError> {
    crate::metrics::render().map_err(|e| {
        warn!(error = %e, "metrics encoding failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable")
    })
}
