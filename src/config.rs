//! Configuration module
//!
//! Loaded from a TOML file (`~/.config/chargenet/config.toml` by default).
//! Every key is optional; missing keys take the defaults below.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::ids::DEFAULT_HASH_LENGTH;
use crate::domain::status::DEFAULT_HISTORY_SIZE;
use crate::support::errors::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub reservations: ReservationConfig,
    pub status: StatusConfig,
    pub station_id: StationIdConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`, or any `EnvFilter` directive
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// Used when a reservation request names no duration
    pub default_duration_secs: u64,
    /// Longer requests are capped to this
    pub max_duration_secs: u64,
    pub expiry_check_interval_secs: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 15 * 60,
            max_duration_secs: 15 * 60,
            expiry_check_interval_secs: 60,
        }
    }
}

impl ReservationConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::seconds(saturating_i64(self.default_duration_secs))
    }

    pub fn max_duration(&self) -> Duration {
        Duration::seconds(saturating_i64(self.max_duration_secs))
    }

    pub fn expiry_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.expiry_check_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Entries kept per status schedule
    pub history_size: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationIdConfig {
    /// Suffix length of hash-derived station ids
    pub hash_length: usize,
}

impl Default for StationIdConfig {
    fn default() -> Self {
        Self {
            hash_length: DEFAULT_HASH_LENGTH,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reservations = &self.reservations;
        if reservations.max_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "reservations.max_duration_secs must be positive".to_string(),
            ));
        }
        if reservations.default_duration_secs == 0
            || reservations.default_duration_secs > reservations.max_duration_secs
        {
            return Err(ConfigError::Invalid(format!(
                "reservations.default_duration_secs must be in 1..={}",
                reservations.max_duration_secs
            )));
        }
        if reservations.expiry_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reservations.expiry_check_interval_secs must be positive".to_string(),
            ));
        }
        if self.status.history_size == 0 {
            return Err(ConfigError::Invalid(
                "status.history_size must be positive".to_string(),
            ));
        }
        if !(1..=31).contains(&self.station_id.hash_length) {
            return Err(ConfigError::Invalid(
                "station_id.hash_length must be in 1..=31".to_string(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format '{other}' is neither 'text' nor 'json'"
            ))),
        }
    }
}

/// `~/.config/chargenet/config.toml`, or `./config.toml` without a home
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("chargenet").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

// chrono rejects second counts above i64::MAX / 1000
fn saturating_i64(value: u64) -> i64 {
    const LIMIT: u64 = (i64::MAX / 1000) as u64;
    value.min(LIMIT) as i64
}
