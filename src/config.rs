use crate::error::ConfigError;
use crate::types::Config;
use anyhow::Result;
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Frame-independent checks. Vertex bounds are checked once the
    /// source's frame size is known, in `ZoneModel::build`.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.zone.polygon.len() < 3 {
            return Err(ConfigError::TooFewVertices(self.zone.polygon.len()));
        }

        let det = &self.detection;
        if det.stationarity_tolerance < 0 {
            return Err(ConfigError::InvalidSetting {
                name: "stationarity_tolerance",
                reason: format!("must be >= 0, got {}", det.stationarity_tolerance),
            });
        }
        if !(det.dwell_threshold_seconds.is_finite() && det.dwell_threshold_seconds > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "dwell_threshold_seconds",
                reason: format!("must be > 0, got {}", det.dwell_threshold_seconds),
            });
        }
        if det.edge_margin < 0 {
            return Err(ConfigError::InvalidSetting {
                name: "edge_margin",
                reason: format!("must be >= 0, got {}", det.edge_margin),
            });
        }
        if det.history_capacity == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "history_capacity",
                reason: "must be > 0".to_string(),
            });
        }
        if det.idle_reset_epochs == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "idle_reset_epochs",
                reason: "must be >= 1 or null".to_string(),
            });
        }
        if self.output.snapshot_quality == 0 || self.output.snapshot_quality > 100 {
            return Err(ConfigError::InvalidSetting {
                name: "snapshot_quality",
                reason: format!("must be in 1..=100, got {}", self.output.snapshot_quality),
            });
        }
        Ok(())
    }
}
