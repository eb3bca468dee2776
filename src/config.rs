//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{AntsError, Result};
use crate::protocol::opcodes::{DeviceAddresses, Microcontroller, PRIMARY_ADDRESS, SECONDARY_ADDRESS};
use crate::transport::MAX_I2C_ADDRESS;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// I2C bus configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default = "default_device_path")]
    pub device_path: String,

    #[serde(default = "default_primary_address")]
    pub primary_address: u8,

    #[serde(default = "default_secondary_address")]
    pub secondary_address: u8,
}

/// Deployment configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeploymentConfig {
    /// Microcontroller brought up at startup (0 = primary, 1 = secondary)
    #[serde(default)]
    pub default_microcontroller: u8,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write daily-rolled log files here when set
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_device_path() -> String { "/dev/i2c-2".to_string() }
fn default_primary_address() -> u8 { PRIMARY_ADDRESS }
fn default_secondary_address() -> u8 { SECONDARY_ADDRESS }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_poll_interval_ms() -> u64 { 2000 }

fn default_log_level() -> String { "info".to_string() }

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
            primary_address: default_primary_address(),
            secondary_address: default_secondary_address(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> AntsError {
    AntsError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ants_driver::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Addresses of the two redundant microcontrollers
    pub fn addresses(&self) -> DeviceAddresses {
        DeviceAddresses {
            primary: self.bus.primary_address,
            secondary: self.bus.secondary_address,
        }
    }

    /// Microcontroller to bring up first
    pub fn default_microcontroller(&self) -> Result<Microcontroller> {
        Microcontroller::try_from(self.deployment.default_microcontroller)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.bus.device_path.is_empty() {
            return Err(invalid("bus device_path cannot be empty"));
        }

        for (name, address) in [
            ("primary_address", self.bus.primary_address),
            ("secondary_address", self.bus.secondary_address),
        ] {
            if address > MAX_I2C_ADDRESS {
                return Err(invalid(format!(
                    "{} 0x{:02X} is not a 7-bit I2C address",
                    name, address
                )));
            }
        }

        if self.bus.primary_address == self.bus.secondary_address {
            return Err(invalid("primary_address and secondary_address must differ"));
        }

        if self.deployment.default_microcontroller > 1 {
            return Err(invalid("default_microcontroller must be 0 or 1"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.poll_interval_ms == 0 || self.telemetry.poll_interval_ms > 60000 {
            return Err(invalid("poll_interval_ms must be between 1 and 60000"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}
