use serde::Serialize;
use thiserror::Error;

use crate::models::RateWindow;
use crate::rate_limit::LimiterConfig;
use crate::store::{CounterStore, StoreError};

pub const API_KEY_SAVED: &str = "API key saved successfully!";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Please enter an API key")]
    EmptyApiKey,
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Trim and store a new key. Blank input is rejected and nothing is written.
pub async fn save_api_key(store: &dyn CounterStore, raw: &str) -> Result<(), SettingsError> {
    let api_key = raw.trim();
    if api_key.is_empty() {
        return Err(SettingsError::EmptyApiKey);
    }
    store.save_api_key(api_key).await?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatus {
    pub count: u32,
    pub max_requests: u32,
    pub remaining: u32,
    pub reset_time: i64,
    pub resets_in: String,
}

impl UsageStatus {
    pub fn new(window: RateWindow, config: LimiterConfig, now_ms: i64) -> Self {
        Self {
            count: window.count,
            max_requests: config.max_requests,
            remaining: config.max_requests.saturating_sub(window.count),
            reset_time: window.reset_time,
            resets_in: format_countdown(window.reset_time - now_ms),
        }
    }
}

// "12m 5s", or "Now" once the window has run out.
pub fn format_countdown(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return "Now".to_string();
    }
    let minutes = remaining_ms / 60_000;
    let seconds = (remaining_ms % 60_000) / 1000;
    format!("{}m {}s", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(0), "Now");
        assert_eq!(format_countdown(-5), "Now");
        assert_eq!(format_countdown(999), "0m 0s");
        assert_eq!(format_countdown(61_500), "1m 1s");
        assert_eq!(format_countdown(3_600_000), "60m 0s");
    }

    #[test]
    fn usage_reports_remaining() {
        let window = RateWindow { count: 4, reset_time: 90_000 };
        let status = UsageStatus::new(window, LimiterConfig::default(), 30_000);
        assert_eq!(status.remaining, 6);
        assert_eq!(status.resets_in, "1m 0s");
    }

    #[tokio::test]
    async fn blank_key_is_not_saved() {
        let store = MemoryStore::new();
        let err = save_api_key(&store, "   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter an API key");
        assert_eq!(store.snapshot().gemini_api_key, None);

        save_api_key(&store, "  key-1 \n").await.unwrap();
        assert_eq!(store.snapshot().gemini_api_key.as_deref(), Some("key-1"));
    }
}
