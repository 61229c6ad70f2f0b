// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::registry::AliasTable;
use crate::sensors::{Interval, SensorType, SourceType, Stat};
use crate::status::StatusTable;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Use the simulated upstream instead of the REST API
    pub demo_mode: bool,

    /// Number of simulated subjects in demo mode
    pub demo_subjects: usize,

    /// Upstream API
    pub api: ApiConfig,

    /// Polling and board settings
    pub monitor: MonitorConfig,

    /// Device sheet and aliasing
    pub devices: DevicesConfig,

    /// Status thresholds, priorities and colors
    pub status: StatusTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo_mode: false,
            demo_subjects: 12,
            api: ApiConfig::default(),
            monitor: MonitorConfig::default(),
            devices: DevicesConfig::default(),
            status: StatusTable::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("radar-monitor"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.status.validate()?;
        self.monitor.validate()?;

        if !self.demo_mode && self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api.base_url",
                reason: "must be set unless demo_mode is enabled".into(),
            });
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "api.timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.devices.replace_column.is_some() && self.devices.table.is_none() {
            return Err(ConfigError::Invalid {
                field: "devices.replace_column",
                reason: "requires devices.table".into(),
            });
        }
        Ok(())
    }

    /// Alias table from the device sheet, empty when aliasing is off
    pub fn load_aliases(&self) -> Result<AliasTable, ConfigError> {
        match (&self.devices.table, &self.devices.replace_column) {
            (Some(table), Some(column)) => {
                AliasTable::load_csv(table, &self.devices.key_column, column)
            }
            _ => Ok(AliasTable::new()),
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// REST API root, e.g. `https://radar-cns.example.org/api`
    pub base_url: String,

    /// Study whose subjects are monitored
    pub study_id: String,

    /// Only sources of this type are monitored
    pub source_type: SourceType,

    /// Statistic requested for sample queries
    pub stat: Stat,

    /// Aggregation window requested for sample queries
    pub interval: Interval,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            study_id: "0".to_string(),
            source_type: SourceType::Empatica,
            stat: Stat::Average,
            interval: Interval::TenSecond,
            timeout_ms: 10_000,
            accept_invalid_certs: false,
        }
    }
}

/// Polling and rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause between polling cycles in milliseconds
    pub api_refresh_ms: u64,

    /// Pause between consecutive sample requests in milliseconds
    pub api_interval_ms: u64,

    /// Status board refresh in milliseconds
    pub render_refresh_ms: u64,

    /// Samples kept per device and sensor, 0 for unbounded
    pub buffer_len: usize,

    /// Sensors fetched on every polling cycle
    pub poll_sensors: Vec<SensorType>,

    /// Sensors that make up a device's priority status
    pub aggregate_sensors: Vec<SensorType>,

    /// Show idle and disconnected devices on the board
    pub show_all: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_refresh_ms: 1_000,
            api_interval_ms: 100,
            render_refresh_ms: 1_000,
            // one week of ten second samples
            buffer_len: 60_480,
            poll_sensors: vec![SensorType::Accelerometer, SensorType::Battery],
            aggregate_sensors: vec![
                SensorType::Accelerometer,
                SensorType::Battery,
                SensorType::BloodVolumePulse,
            ],
            show_all: false,
        }
    }
}

impl MonitorConfig {
    pub fn api_refresh(&self) -> Duration {
        Duration::from_millis(self.api_refresh_ms)
    }

    pub fn api_interval(&self) -> Duration {
        Duration::from_millis(self.api_interval_ms)
    }

    pub fn render_refresh(&self) -> Duration {
        Duration::from_millis(self.render_refresh_ms)
    }

    /// Buffer bound, `None` when unbounded
    pub fn max_samples(&self) -> Option<usize> {
        (self.buffer_len > 0).then_some(self.buffer_len)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("monitor.api_refresh_ms", self.api_refresh_ms),
            ("monitor.render_refresh_ms", self.render_refresh_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.poll_sensors.is_empty() {
            return Err(ConfigError::Invalid {
                field: "monitor.poll_sensors",
                reason: "at least one sensor must be polled".into(),
            });
        }
        Ok(())
    }
}

/// Device sheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// CSV device sheet
    pub table: Option<PathBuf>,

    /// Column holding the raw source id
    pub key_column: String,

    /// Column whose value replaces the raw source id
    pub replace_column: Option<String>,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            table: None,
            key_column: "MAC".to_string(),
            replace_column: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.monitor.buffer_len, created.monitor.buffer_len);
        assert_eq!(loaded.status, created.status);
        assert_eq!(loaded.monitor.poll_sensors, created.monitor.poll_sensors);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            demo_mode = true

            [monitor]
            api_refresh_ms = 5000
            aggregate_sensors = ["ACCELEROMETER", "HEART_RATE"]
            "#,
        )
        .unwrap();
        assert!(config.demo_mode);
        assert_eq!(config.monitor.api_refresh_ms, 5_000);
        assert_eq!(config.monitor.api_interval_ms, 100);
        assert_eq!(
            config.monitor.aggregate_sensors,
            vec![SensorType::Accelerometer, SensorType::HeartRate]
        );
        assert_eq!(config.status.priority(Status::Critical), 4);
    }

    #[test]
    fn test_custom_status_table() {
        let config: Config = toml::from_str(
            r#"
            [[status.levels]]
            status = "GOOD"
            priority = 1
            age_minutes = 0.0
            battery_level = 0.1
            color = "lightgreen"

            [[status.levels]]
            status = "WARNING"
            priority = 3
            age_minutes = 5.0
            battery_level = 0.05
            color = "orange"

            [[status.levels]]
            status = "CRITICAL"
            priority = 4
            age_minutes = 10.0
            battery_level = 0.0
            color = "red"

            [[status.levels]]
            status = "DISCONNECTED"
            priority = 0
            age_minutes = 15.0
            color = "transparent"

            [[status.levels]]
            status = "N/A"
            priority = -1
            color = "lightgrey"
            "#,
        )
        .unwrap();
        // OK is deliberately absent from this table
        config.validate().unwrap();
        let acc = SensorType::Accelerometer;
        assert_eq!(
            config.status.classify(acc, Some(chrono::Duration::minutes(4)), None),
            Status::Good
        );
        assert_eq!(
            config.status.classify(acc, Some(chrono::Duration::minutes(12)), None),
            Status::Critical
        );
        assert_eq!(
            config.status.classify(acc, Some(chrono::Duration::minutes(15)), None),
            Status::Disconnected
        );
    }

    #[test]
    fn test_replace_column_requires_table() {
        let mut config = Config::default();
        config.devices.replace_column = Some("Name".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "devices.replace_column", .. })
        ));
    }

    #[test]
    fn test_invalid_intervals() {
        let mut config = Config::default();
        config.monitor.render_refresh_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.monitor.buffer_len = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_unbounded_buffer_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.monitor.buffer_len = 0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.monitor.buffer_len, 0);
        assert_eq!(loaded.monitor.max_samples(), None);

        let partial: Config = toml::from_str("[monitor]\napi_refresh_ms = 5000\n").unwrap();
        assert_eq!(partial.monitor.max_samples(), Some(60_480));
    }
}
