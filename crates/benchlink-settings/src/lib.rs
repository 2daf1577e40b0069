//! # Benchlink Settings
//!
//! Configuration file handling for the bench console. Supports TOML and
//! JSON files in platform-specific config directories, with validation.

pub mod config;
pub mod error;

pub use config::{BenchConfig, ConnectionSettings, DisplaySettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
