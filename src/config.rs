//! Configuration for gaze dataset preparation.

use crate::core::{DEFAULT_FRAME_RATE, DEFAULT_MIN_WINDOW_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for a preparation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames per second of the recordings
    pub frame_rate: f64,

    /// Longest tolerated run of missing frames inside a window (in seconds)
    pub gap_tolerance_secs: f64,

    /// Minimum valid duration of a minority-class window (in seconds)
    pub min_window_secs: f64,

    /// Seed for rebalancing and splits
    pub seed: u64,

    /// Worker threads used to process recordings
    pub workers: usize,

    /// Dataset split settings
    pub split: SplitConfig,

    /// Default directory for exported tables
    pub export_path: PathBuf,

    /// Path for run reports
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-prep");

        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            gap_tolerance_secs: 1.0,
            min_window_secs: DEFAULT_MIN_WINDOW_SECS,
            seed: 42,
            workers: 5,
            split: SplitConfig::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-prep")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Location of the run report.
    pub fn report_path(&self) -> PathBuf {
        self.data_path.join("report.json")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(self.gap_tolerance_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gap_tolerance_secs must not be negative, got {}",
                self.gap_tolerance_secs
            )));
        }
        if !(self.min_window_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_window_secs must not be negative, got {}",
                self.min_window_secs
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        self.split.validate()
    }
}

/// Subject-grouped split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub val_fraction: f64,
    pub folds: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            val_fraction: 0.2,
            folds: 5,
        }
    }
}

impl SplitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("test_fraction", self.test_fraction),
            ("val_fraction", self.val_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie strictly between 0 and 1, got {value}"
                )));
            }
        }
        if self.folds < 2 {
            return Err(ConfigError::Invalid(format!(
                "folds must be at least 2, got {}",
                self.folds
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.frame_rate, 5.0);
        assert_eq!(config.gap_tolerance_secs, 1.0);
        assert_eq!(config.min_window_secs, 20.0);
        assert_eq!(config.seed, 42);
        assert_eq!(config.workers, 5);
        assert_eq!(config.split.folds, 5);
        assert!(config.validate().is_ok());
        assert!(config.report_path().ends_with("report.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.frame_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gap_tolerance_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.split.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.split.folds = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.seed = 7;
        config.min_window_secs = 12.5;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "workers": 2, "split": { "folds": 3 } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.split.folds, 3);
        assert_eq!(config.split.test_fraction, 0.2);
        assert_eq!(config.frame_rate, 5.0);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "frame_rate": -5.0 }"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
