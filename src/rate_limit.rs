// Fixed window quota. Best effort: check and record are separate
// read-modify-write steps, so overlapping runs can go slightly over.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::models::RateWindow;
use crate::store::{CounterStore, StoreError};

pub const DEFAULT_MAX_REQUESTS: u32 = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(3_600_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl LimiterConfig {
    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    // "per hour", "per 5 minutes", "per 30 seconds"
    pub fn window_phrase(&self) -> String {
        let secs = self.window.as_secs();
        match secs {
            3600 => "per hour".to_string(),
            s if s % 3600 == 0 => format!("per {} hours", s / 3600),
            60 => "per minute".to_string(),
            s if s % 60 == 0 => format!("per {} minutes", s / 60),
            1 => "per second".to_string(),
            s => format!("per {} seconds", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub admitted: bool,
    pub remaining: u32,
    pub reset_time: i64,
}

// Replace an expired (or absent) window with a fresh one.
pub fn normalize(window: Option<RateWindow>, now_ms: i64, window_ms: i64) -> RateWindow {
    match window {
        Some(w) if !w.is_expired(now_ms) => w,
        _ => RateWindow::fresh(now_ms, window_ms),
    }
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: LimiterConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: LimiterConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> LimiterConfig {
        self.config
    }

    // Load the window and persist a reset if one happened
    async fn current_window(&self, now_ms: i64) -> Result<RateWindow, StoreError> {
        let stored = self.store.load_window().await?;
        let window = normalize(stored, now_ms, self.config.window_millis());
        if stored != Some(window) {
            debug!(reset_time = window.reset_time, "rate window reset");
            self.store.save_window(window).await?;
        }
        Ok(window)
    }

    // Doesn't touch `count`; only a window reset is written back.
    pub async fn check_admission(&self, now_ms: i64) -> Result<Admission, StoreError> {
        let window = self.current_window(now_ms).await?;
        Ok(Admission {
            admitted: window.count < self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_time: window.reset_time,
        })
    }

    // Count one issued outbound request. Returns the updated window.
    pub async fn record_request(&self, now_ms: i64) -> Result<RateWindow, StoreError> {
        let stored = self.store.load_window().await?;
        let mut window = normalize(stored, now_ms, self.config.window_millis());
        window.count = window.count.saturating_add(1);
        self.store.save_window(window).await?;
        Ok(window)
    }

    // Window as the settings page shows it.
    pub async fn usage(&self, now_ms: i64) -> Result<RateWindow, StoreError> {
        self.current_window(now_ms).await
    }
}
