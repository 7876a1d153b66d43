use crate::error::{NexusError, NexusResult};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Minimum level kept by the in-memory logger
    pub log_level: LogLevel,

    /// Tracing filter used when `RUST_LOG` is not set
    pub log_filter: String,

    /// How the manager counts executions
    pub stats_policy: StatsPolicy,

    /// Offset added to every sensor reading before averaging
    pub sensor_calibration: f64,
}

/// Which executions the manager counts per pipeline id
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsPolicy {
    /// Count only executions that returned successfully
    #[default]
    SuccessOnly,

    /// Count every execution that reached a registered pipeline
    Attempts,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_filter: "warn".to_string(),
            stats_policy: StatsPolicy::SuccessOnly,
            sensor_calibration: 0.0,
        }
    }
}

impl NexusConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> NexusResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> NexusResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NexusResult<()> {
        if !self.sensor_calibration.is_finite() {
            return Err(NexusError::ConfigError(format!(
                "sensor_calibration must be finite, got {}",
                self.sensor_calibration
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(NexusError::ConfigError(
                "log_filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
