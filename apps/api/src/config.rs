use std::time::Duration;

use anyhow::{Context, Result};

use crate::session::retry::PollConfig;

/// Upload cap for resume files, enforced before the extraction call.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external analysis API, e.g. "http://localhost:5000/api".
    pub upstream_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Post-checkout credit polling: attempts and interval between them.
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            upstream_base_url: require_env("UPSTREAM_API_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            confirm_attempts: std::env::var("CONFIRM_ATTEMPTS")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u32>()
                .context("CONFIRM_ATTEMPTS must be a number")?,
            confirm_interval_ms: std::env::var("CONFIRM_INTERVAL_MS")
                .unwrap_or_else(|_| "800".to_string())
                .parse::<u64>()
                .context("CONFIRM_INTERVAL_MS must be a number")?,
        })
    }

    pub fn confirm_poll(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.confirm_attempts,
            interval: Duration::from_millis(self.confirm_interval_ms),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
