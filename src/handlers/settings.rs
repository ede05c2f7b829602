use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{ApiError, api_error};
use crate::settings::{self, API_KEY_SAVED, SettingsError, UsageStatus};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyBody {
    pub api_key: Option<String>,
}

pub async fn get_api_key_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiKeyBody>, ApiError> {
    let api_key = state.store.load_api_key().await.map_err(|e| {
        warn!(error = %e, "could not read api key");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error loading API key")
    })?;
    Ok(Json(ApiKeyBody { api_key }))
}

pub async fn put_api_key_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ApiKeyBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let raw = body.api_key.unwrap_or_default();
    match settings::save_api_key(state.store.as_ref(), &raw).await {
        Ok(()) => {
            info!("api key updated");
            Ok(Json(serde_json::json!({ "message": API_KEY_SAVED })))
        }
        Err(e @ SettingsError::EmptyApiKey) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(SettingsError::Store(e)) => {
            warn!(error = %e, "could not save api key");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error saving API key"))
        }
    }
}

// Reading usage also rolls an expired window over, like the settings page does
pub async fn usage_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsageStatus>, ApiError> {
    let limiter = state.analyzer.limiter();
    let now = state.analyzer.now_millis();
    let window = limiter.usage(now).await.map_err(|e| {
        warn!(error = %e, "could not read usage");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error")
    })?;
    Ok(Json(UsageStatus::new(window, limiter.config(), now)))
}
