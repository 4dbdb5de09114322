//! Configuration structures
//!
//! Every field carries a serde default so partial JSON/TOML files load
//! cleanly. Loading itself lives in `deskpulse-infra::config`.

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

use crate::constants::IDLE_TICK_MS;
use crate::{DeskPulseError, Result};

/// Largest UTC offset accepted for bucketing, in minutes (±14h).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub ingestion: IngestionConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Input capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub enabled: bool,
    /// Period of the idle ticker that closes typing bursts and trails.
    pub idle_tick_ms: u64,
    /// Upper bound on the drain/close sequence during stop.
    pub stop_timeout_ms: u64,
    /// Offset used for (date, hour) bucketing. Local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_tick_ms: IDLE_TICK_MS,
            stop_timeout_ms: 3_000,
            utc_offset_minutes: None,
        }
    }
}

impl CaptureConfig {
    /// Resolve the configured offset, falling back to the machine's local offset.
    ///
    /// An out-of-range value also falls back; [`Self::validate`] rejects it
    /// at load time.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix())
    }

    /// # Errors
    /// Returns `DeskPulseError::Config` if `utc_offset_minutes` is outside ±14h.
    pub fn validate(&self) -> Result<()> {
        match self.utc_offset_minutes {
            Some(minutes) if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) => {
                Err(DeskPulseError::Config(format!("UTC offset out of range: {} minutes", minutes)))
            }
            _ => Ok(()),
        }
    }
}

impl Config {
    /// Check values that deserialize cleanly but cannot be used.
    ///
    /// # Errors
    /// Returns `DeskPulseError::Config` for the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()
    }
}

/// Browser ingestion server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub enabled: bool,
    pub bind_address: String,
    /// Listening port. `0` binds an ephemeral port.
    pub port: u16,
    pub shutdown_timeout_ms: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            port: 8765,
            shutdown_timeout_ms: 3_000,
        }
    }
}

/// Batch analysis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cron expression (with seconds) for nightly pattern detection.
    pub pattern_cron: String,
    pub job_timeout_secs: u64,
    /// Number of peak hours reported in daily reports.
    pub peak_hours: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { pattern_cron: "0 5 0 * * *".to_string(), job_timeout_secs: 120, peak_hours: 3 }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Directory for daily-rolling log files. Console only when unset.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false, directory: None }
    }
}
