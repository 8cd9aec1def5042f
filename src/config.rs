//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a serde default, so an empty file (or a file with only
//! some sections) is a valid configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{DashError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub subsystems: SubsystemsConfig,
    #[serde(default)]
    pub graphs: GraphsConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Robot connection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,
}

/// Telemetry section store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_pause_buffer_size")]
    pub pause_buffer_size: usize,
}

/// Subsystem store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SubsystemsConfig {
    #[serde(default = "default_position_history_cap")]
    pub position_history_cap: usize,
}

/// Graph store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GraphsConfig {
    #[serde(default = "default_rolling_capacity")]
    pub rolling_capacity: usize,

    #[serde(default = "default_time_window_s")]
    pub default_time_window_s: u32,
}

/// Recording replay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files; empty disables file logging.
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_reconnect_interval_ms() -> u64 { 1000 }
fn default_status_poll_interval_ms() -> u64 { 1000 }

fn default_pause_buffer_size() -> usize { 1000 }

fn default_position_history_cap() -> usize { 100 }

fn default_rolling_capacity() -> usize { 200 }
fn default_time_window_s() -> u32 { 30 }

fn default_tick_ms() -> u64 { 100 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            status_poll_interval_ms: default_status_poll_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { pause_buffer_size: default_pause_buffer_size() }
    }
}

impl Default for SubsystemsConfig {
    fn default() -> Self {
        Self { position_history_cap: default_position_history_cap() }
    }
}

impl Default for GraphsConfig {
    fn default() -> Self {
        Self {
            rolling_capacity: default_rolling_capacity(),
            default_time_window_s: default_time_window_s(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { tick_ms: default_tick_ms() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

/// Allowed values for `logging.level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

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
    /// use robot_dash::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.is_empty() {
            return Err(invalid("connection host cannot be empty"));
        }

        if self.connection.port == 0 {
            return Err(invalid("port must be between 1 and 65535"));
        }

        if self.connection.reconnect_interval_ms == 0 || self.connection.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.connection.status_poll_interval_ms == 0 || self.connection.status_poll_interval_ms > 60000 {
            return Err(invalid("status_poll_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.pause_buffer_size == 0 || self.telemetry.pause_buffer_size > 100_000 {
            return Err(invalid("pause_buffer_size must be between 1 and 100000"));
        }

        if self.subsystems.position_history_cap == 0 || self.subsystems.position_history_cap > 10_000 {
            return Err(invalid("position_history_cap must be between 1 and 10000"));
        }

        if self.graphs.rolling_capacity == 0 || self.graphs.rolling_capacity > 10_000 {
            return Err(invalid("rolling_capacity must be between 1 and 10000"));
        }

        if self.graphs.default_time_window_s == 0 || self.graphs.default_time_window_s > 3600 {
            return Err(invalid("default_time_window_s must be between 1 and 3600"));
        }

        if self.replay.tick_ms == 0 || self.replay.tick_ms > 10_000 {
            return Err(invalid("tick_ms must be between 1 and 10000"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }

    /// Address string for the robot connection (`host:port`)
    pub fn robot_addr(&self) -> String {
        format!("{}:{}", self.connection.host, self.connection.port)
    }
}

fn invalid(msg: &str) -> DashError {
    DashError::Config(toml::de::Error::custom(msg))
}
