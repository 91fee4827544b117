//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Service configuration, read from `PLOXI_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP API listens on.
    pub port: u16,
    /// Path of the libSQL file backing durable handoff slots.
    pub db_path: PathBuf,
    /// Simulated network delay of the logging submit effect.
    pub submit_delay: Duration,
    /// Base URL of the real registration backend. When unset, submissions
    /// are logged instead of posted.
    pub register_endpoint: Option<String>,
    /// Idle time after which a mounted flow and its session slots expire.
    pub session_ttl: Duration,
    /// How often expired sessions are swept.
    pub sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/ploxi.db"),
            submit_delay: Duration::from_millis(2000),
            register_endpoint: None,
            session_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PLOXI_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "PLOXI_PORT".into(),
                message: format!("{raw:?} is not a port number: {e}"),
            })?,
            None => defaults.port,
        };

        let db_path = lookup("PLOXI_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let submit_delay = match lookup("PLOXI_SUBMIT_DELAY_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "PLOXI_SUBMIT_DELAY_MS".into(),
                    message: format!("{raw:?} is not a number of milliseconds: {e}"),
                })?;
                Duration::from_millis(ms)
            }
            None => defaults.submit_delay,
        };

        let register_endpoint = lookup("PLOXI_REGISTER_ENDPOINT")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let session_ttl = seconds(&lookup, "PLOXI_SESSION_TTL_SECS")?.unwrap_or(defaults.session_ttl);
        let sweep_interval =
            seconds(&lookup, "PLOXI_SWEEP_INTERVAL_SECS")?.unwrap_or(defaults.sweep_interval);

        Ok(Self {
            port,
            db_path,
            submit_delay,
            register_endpoint,
            session_ttl,
            sweep_interval,
        })
    }
}

/// A positive whole number of seconds under `key`.
fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: "must be at least one second".into(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("{raw:?} is not a number of seconds: {e}"),
        }),
    }
}
