//! Configuration model and persistence
//!
//! Settings are organized into sections mirroring the crates that consume
//! them: connection parameters for the serial link and display tuning for
//! the time-series views. Files may be TOML or JSON, chosen by extension;
//! the default location is the platform config directory.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Last used port (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate; bench firmware revisions ship with 9600, 57600, or 115200
    pub baud_rate: u32,
    /// Device-settle delay after opening the port, in milliseconds
    pub settle_delay_ms: u64,
    /// Poll tick period in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 57600,
            settle_delay_ms: 2000,
            poll_interval_ms: 100,
        }
    }
}

/// Display/buffering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Trailing window for scrolling channels, in seconds
    pub window_s: f64,
    /// How many windows of history to keep before pruning
    pub retention_multiple: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            window_s: benchlink_core::DEFAULT_WINDOW_S,
            retention_multiple: 4.0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Serial connection settings
    pub connection: ConnectionSettings,
    /// Display/buffering settings
    pub display: DisplaySettings,
}

impl BenchConfig {
    /// Default config file location in the platform config directory
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| SettingsError::ConfigDirectory("no config directory".to_string()))?;
        Ok(base.join("benchlink").join("config.toml"))
    }

    /// Load configuration from a TOML or JSON file, chosen by extension
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match extension(path)? {
            Format::Toml => toml::from_str(&contents)?,
            Format::Json => serde_json::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML or JSON file, chosen by extension.
    /// Parent directories are created as needed.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = match extension(path)? {
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(e.to_string()))?,
            Format::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, contents)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Load from the default path, falling back to defaults when the file
    /// does not exist yet
    pub fn load_or_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.baud_rate == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "connection.baud_rate".to_string(),
                value: "0".to_string(),
            });
        }
        if self.connection.poll_interval_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "connection.poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }
        if !(self.display.window_s.is_finite() && self.display.window_s > 0.0) {
            return Err(ConfigError::ValueOutOfRange {
                key: "display.window_s".to_string(),
                value: self.display.window_s.to_string(),
            });
        }
        if !(self.display.retention_multiple.is_finite() && self.display.retention_multiple >= 1.0)
        {
            return Err(ConfigError::ValueOutOfRange {
                key: "display.retention_multiple".to_string(),
                value: self.display.retention_multiple.to_string(),
            });
        }
        Ok(())
    }
}

enum Format {
    Toml,
    Json,
}

fn extension(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
