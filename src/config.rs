//! Configuration management and validation.
//!
//! Provides the importer settings (data location, fallback period and
//! vendor directory, worker pool sizing) with JSON file persistence.
//! Keys absent from the file take their default values, so older settings
//! files keep working when new options are added.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_AIRAC_PERIOD, DEFAULT_AUTO_WORKERS_RATIO,
    DEFAULT_VENDOR_DIR, DEFAULT_VENDOR_PREFIX, MAX_WORKERS_RATIO,
};
use crate::error::{EaipError, Result};
use crate::period::is_valid_period;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Literal `"auto"` in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoWorkers {
    Auto,
}

/// Worker count setting: `"auto"` or an explicit number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxWorkers {
    Fixed(usize),
    Auto(AutoWorkers),
}

impl Default for MaxWorkers {
    fn default() -> Self {
        MaxWorkers::Auto(AutoWorkers::Auto)
    }
}

/// Import pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Worker threads for per-airport indexing
    pub max_workers: MaxWorkers,

    /// Share of CPU threads used in auto mode
    pub auto_workers_ratio: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_workers: MaxWorkers::default(),
            auto_workers_ratio: DEFAULT_AUTO_WORKERS_RATIO,
        }
    }
}

/// Global configuration for EAIP importing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Root holding one directory per AIRAC period
    pub data_path: PathBuf,

    /// Period used when the archive folder name carries none
    pub default_period: String,

    /// Vendor directory name used when none is detected under `Data/`
    pub default_vendor_dir: String,

    /// Prefix identifying the vendor directory under `Data/`
    pub vendor_prefix: String,

    /// Import pipeline settings
    pub import: ImportSettings,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            default_period: DEFAULT_AIRAC_PERIOD.to_string(),
            default_vendor_dir: DEFAULT_VENDOR_DIR.to_string(),
            vendor_prefix: DEFAULT_VENDOR_PREFIX.to_string(),
            import: ImportSettings::default(),
        }
    }
}

impl ImporterConfig {
    /// Load configuration from a JSON file, merging missing keys with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ImporterConfig = serde_json::from_str(&contents).map_err(|e| {
            EaipError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, writing the defaults to `path` when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        if let Err(e) = config.save(path) {
            warn!("Could not write default config to {}: {}", path.display(), e);
        } else {
            info!("Created default configuration at {}", path.display());
        }
        Ok(config)
    }

    /// Persist configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !is_valid_period(&self.default_period) {
            return Err(EaipError::configuration(format!(
                "default_period must be 4 digits (YYMM), got '{}'",
                self.default_period
            )));
        }

        if self.default_vendor_dir.trim().is_empty() {
            return Err(EaipError::configuration(
                "default_vendor_dir must not be empty",
            ));
        }

        if !(self.import.auto_workers_ratio > 0.0 && self.import.auto_workers_ratio <= 1.0) {
            return Err(EaipError::configuration(format!(
                "import.auto_workers_ratio must be in (0, 1], got {}",
                self.import.auto_workers_ratio
            )));
        }

        Ok(())
    }

    /// Set the data root
    pub fn with_data_path(mut self, data_path: impl Into<PathBuf>) -> Self {
        self.data_path = data_path.into();
        self
    }

    /// Set the fallback AIRAC period
    pub fn with_default_period(mut self, period: impl Into<String>) -> Self {
        self.default_period = period.into();
        self
    }

    /// Use an explicit worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.import.max_workers = if workers == 0 {
            MaxWorkers::default()
        } else {
            MaxWorkers::Fixed(workers)
        };
        self
    }

    /// Worker count for the indexing pool on this machine
    pub fn import_workers(&self) -> usize {
        self.import_workers_for(num_cpus::get())
    }

    /// Worker count for a machine with `cpu_count` threads.
    ///
    /// Auto mode uses `cpu_count * auto_workers_ratio`; either way the result
    /// is capped at 70% of the CPU threads and is at least 1.
    pub fn import_workers_for(&self, cpu_count: usize) -> usize {
        let cpu_count = cpu_count.max(1);
        let max_allowed = ((cpu_count as f64) * MAX_WORKERS_RATIO) as usize;

        let requested = match self.import.max_workers {
            MaxWorkers::Fixed(workers) => workers,
            MaxWorkers::Auto(_) => ((cpu_count as f64) * self.import.auto_workers_ratio) as usize,
        };

        requested.min(max_allowed).max(1)
    }
}

/// Default settings file location in the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Default data root in the platform data directory, `./data` as a fallback
pub fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("data"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ImporterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_period, "2505");
        assert_eq!(config.import.max_workers, MaxWorkers::Auto(AutoWorkers::Auto));
    }

    #[test]
    fn test_worker_calculation() {
        let config = ImporterConfig::default();
        // auto: 50% of 8 = 4, cap 70% of 8 = 5
        assert_eq!(config.import_workers_for(8), 4);
        // single core still gets one worker
        assert_eq!(config.import_workers_for(1), 1);

        let config = ImporterConfig::default().with_workers(16);
        // capped at 70% of 10
        assert_eq!(config.import_workers_for(10), 7);

        let config = ImporterConfig::default().with_workers(2);
        assert_eq!(config.import_workers_for(10), 2);
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"default_period": "2511", "import": {"max_workers": 3}}"#,
        )
        .unwrap();

        let config = ImporterConfig::load(&path).unwrap();
        assert_eq!(config.default_period, "2511");
        assert_eq!(config.import.max_workers, MaxWorkers::Fixed(3));
        assert_eq!(config.import.auto_workers_ratio, DEFAULT_AUTO_WORKERS_RATIO);
        assert_eq!(config.vendor_prefix, "EAIP");
    }

    #[test]
    fn test_auto_workers_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let config = ImporterConfig::default().with_data_path(temp_dir.path().join("data"));
        config.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"auto\""));

        let loaded = ImporterConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let config = ImporterConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, ImporterConfig::default());
    }

    #[test]
    fn test_invalid_period_rejected() {
        let config = ImporterConfig::default().with_default_period("25-05");
        assert!(matches!(
            config.validate(),
            Err(EaipError::Configuration { .. })
        ));
    }
}
