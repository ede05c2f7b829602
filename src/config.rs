use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::rate_limit::LimiterConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "selection-explainer")]
#[command(about = "Rate limited gateway that explains selected text with Gemini")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // JSON file holding the api key and the rate window
    #[arg(short, long, default_value = "selection-explainer.json")]
    pub state_file: PathBuf,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 3600)]
    pub rate_window: u64,

    // Provider host, without path
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    // Seeds the stored key on startup when given
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate limit must allow at least one request")]
    ZeroRateLimit,
    #[error("rate window must be at least one second")]
    ZeroRateWindow,
}

impl Args {
    pub fn limiter_config(&self) -> Result<LimiterConfig, ConfigError> {
        if self.rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if self.rate_window == 0 {
            return Err(ConfigError::ZeroRateWindow);
        }
        Ok(LimiterConfig {
            max_requests: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
        })
    }
}
