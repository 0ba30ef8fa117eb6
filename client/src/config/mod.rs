//! Central module for client-side authorization settings.
//!
//! This module handles loading where the session blob is persisted, the key it
//! is stored under, and the windows used to decide when a token needs refreshing.

use anyhow::{Context, Result};
use chrono::Duration;
use expanduser::expanduser;
use std::env;
use std::path::PathBuf;

/// Storage key the session blob is persisted under by default.
pub const DEFAULT_STORAGE_KEY: &str = "authData";

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub refresh_window_seconds: u64,
    pub refresh_interval_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let storage_dir = env::var("AUTH_STORAGE_DIR").unwrap_or_else(|_| "~/.storefront".to_string());
        let storage_dir = expanduser(&storage_dir)
            .with_context(|| format!("AUTH_STORAGE_DIR could not be expanded: {}", storage_dir))?;

        let storage_key =
            env::var("AUTH_STORAGE_KEY").unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            anyhow::bail!("AUTH_STORAGE_KEY must not be empty");
        }

        let refresh_window_seconds = env::var("AUTH_REFRESH_WINDOW_SECONDS")
            .unwrap_or_else(|_| "600".to_string())
            .parse::<u64>()
            .context("AUTH_REFRESH_WINDOW_SECONDS must be a valid number")?;
        seconds_to_duration(refresh_window_seconds)
            .context("AUTH_REFRESH_WINDOW_SECONDS is out of range")?;

        let refresh_interval_seconds = env::var("AUTH_REFRESH_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .context("AUTH_REFRESH_INTERVAL_SECONDS must be a valid number")?;

        Ok(Config {
            storage_dir,
            storage_key,
            refresh_window_seconds,
            refresh_interval_seconds,
        })
    }

    /// How close to expiry an access token may get before it should be refreshed.
    ///
    /// Saturates at the largest representable duration.
    pub fn refresh_window(&self) -> Duration {
        seconds_to_duration(self.refresh_window_seconds).unwrap_or(Duration::MAX)
    }
}

fn seconds_to_duration(seconds: u64) -> Option<Duration> {
    i64::try_from(seconds).ok().and_then(Duration::try_seconds)
}
