//! Typed configuration from environment variables.
//!
//! Loads once at startup and fails fast on unparseable values. Every
//! variable is optional.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::store::{MAX_NOTICE_KEY_LENGTH, StoreConfig};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    /// Checkpoint file for the notice set. `None` keeps notices in memory only.
    pub state_file: Option<PathBuf>,
    /// How often the expiry sweep runs.
    pub sweep_interval: Duration,
    pub max_key_length: usize,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_key_length: MAX_NOTICE_KEY_LENGTH,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let sweep_interval = match parsed_var::<u64>("NOTICEBOARD_SWEEP_INTERVAL_SECS")? {
            Some(0) => {
                return Err(Error::Config(
                    "NOTICEBOARD_SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.sweep_interval,
        };
        Ok(Self {
            state_file: optional_var("NOTICEBOARD_STATE_FILE").map(PathBuf::from),
            sweep_interval,
            max_key_length: parsed_var("NOTICEBOARD_MAX_KEY_LENGTH")?
                .unwrap_or(defaults.max_key_length),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Store limits and defaults derived from this configuration.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_key_length: self.max_key_length,
            ..StoreConfig::default()
        }
    }
}

/// Unset and empty are the same thing.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}")))
        })
        .transpose()
}
