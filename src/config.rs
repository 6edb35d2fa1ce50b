//! Configuration loader for the `fieldwatch` dashboard.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Keeping every `env::var` call here means pages and
//! feeds only ever see a typed, immutable [`Config`].
//!
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::weather::Location;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional floating-point environment variable.
macro_rules! parse_env_f64 {
    ($var_name:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Irrigation backend base URL (without the `/api` suffix).
    pub api_base_url: String,

    /// Open-Meteo forecast endpoint.
    pub weather_api_url: String,

    /// Farm coordinates; `None` disables the weather card.
    pub location: Option<Location>,

    /// Directory holding the client cache files.
    pub cache_dir: PathBuf,

    pub sensor_poll: Duration,
    pub alerts_poll: Duration,
    pub status_poll: Duration,
    pub analytics_poll: Duration,
    pub weather_poll: Duration,

    /// How often `watch` redraws the screen.
    pub render_interval: Duration,

    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `API_BASE_URL` – irrigation backend, e.g. `http://farm.local:8000`
///
/// Optional:
/// - `WEATHER_API_URL` – default: Open-Meteo forecast endpoint
/// - `WEATHER_LATITUDE` / `WEATHER_LONGITUDE` – both or neither
/// - `CACHE_DIR` – default: `.fieldwatch-cache`
/// - `SENSOR_POLL_SECS` (5), `ALERTS_POLL_SECS` (5), `STATUS_POLL_SECS` (5),
///   `ANALYTICS_POLL_SECS` (10), `WEATHER_POLL_SECS` (600)
/// - `RENDER_INTERVAL_SECS` (5), `HTTP_TIMEOUT_SECS` (10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_base_url = require_env!("API_BASE_URL");
    let weather_api_url =
        env::var("WEATHER_API_URL").unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string());
    let cache_dir = env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".fieldwatch-cache"));

    let location = match (
        parse_env_f64!("WEATHER_LATITUDE"),
        parse_env_f64!("WEATHER_LONGITUDE"),
    ) {
        (Some(latitude), Some(longitude)) => Some(Location {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => {
            return Err(anyhow!(
                "WEATHER_LATITUDE and WEATHER_LONGITUDE must be set together"
            ))
        }
    };

    let secs = |n: u64| -> Result<Duration> {
        if n == 0 {
            Err(anyhow!("Poll and timeout intervals must be at least 1 second"))
        } else {
            Ok(Duration::from_secs(n))
        }
    };

    Ok(Config {
        api_base_url,
        weather_api_url,
        location,
        cache_dir,
        sensor_poll: secs(parse_env_u64!("SENSOR_POLL_SECS", 5))?,
        alerts_poll: secs(parse_env_u64!("ALERTS_POLL_SECS", 5))?,
        status_poll: secs(parse_env_u64!("STATUS_POLL_SECS", 5))?,
        analytics_poll: secs(parse_env_u64!("ANALYTICS_POLL_SECS", 10))?,
        weather_poll: secs(parse_env_u64!("WEATHER_POLL_SECS", 600))?,
        render_interval: secs(parse_env_u64!("RENDER_INTERVAL_SECS", 5))?,
        http_timeout: secs(parse_env_u64!("HTTP_TIMEOUT_SECS", 10))?,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let location = self
            .location
            .map(|l| format!("{}, {}", l.latitude, l.longitude))
            .unwrap_or_else(|| "(not set, weather disabled)".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  API_BASE_URL        : {}", self.api_base_url);
        tracing::info!("  WEATHER_API_URL     : {}", self.weather_api_url);
        tracing::info!("  WEATHER_LOCATION    : {}", location);
        tracing::info!("  CACHE_DIR           : {}", self.cache_dir.display());
        tracing::info!("  SENSOR_POLL_SECS    : {}", self.sensor_poll.as_secs());
        tracing::info!("  ALERTS_POLL_SECS    : {}", self.alerts_poll.as_secs());
        tracing::info!("  STATUS_POLL_SECS    : {}", self.status_poll.as_secs());
        tracing::info!("  ANALYTICS_POLL_SECS : {}", self.analytics_poll.as_secs());
        tracing::info!("  WEATHER_POLL_SECS   : {}", self.weather_poll.as_secs());
        tracing::info!("  RENDER_INTERVAL_SECS: {}", self.render_interval.as_secs());
        tracing::info!("  HTTP_TIMEOUT_SECS   : {}", self.http_timeout.as_secs());
    }
}
