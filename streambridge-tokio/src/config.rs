//! Configuration for the streambridge daemon
//!
//! Loaded from a TOML file. Only the TCP port and the serial device are
//! required, everything else has a default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use streambridge_core::{BridgeConfig, DEFAULT_MAX_READ_PER_TICK};

use crate::error::{AppError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub serial: SerialConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TCP side and bridge loop
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// TCP listening port
    pub port: u16,

    /// Interface to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Pause between bridge ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Serial bytes read per tick before clients get their turn (0 = no cap)
    #[serde(default = "default_max_read_per_tick")]
    pub max_read_per_tick: usize,

    /// Drop clients that send nothing for this long (0 = never)
    #[serde(default)]
    pub client_idle_timeout_secs: u64,
}

/// Serial device
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device path (e.g. "/dev/ttyUSB0")
    pub path: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_tick_interval_ms() -> u64 {
    10
}
fn default_max_read_per_tick() -> usize {
    DEFAULT_MAX_READ_PER_TICK
}
fn default_baud_rate() -> u32 {
    115_200
}
fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use streambridge_tokio::config::AppConfig;
    ///
    /// let config = AppConfig::load("/etc/streambridge.toml")?;
    /// # Ok::<(), streambridge_tokio::AppError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }
        if self.server.tick_interval_ms == 0 {
            return Err(AppError::InvalidConfig(
                "server.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.serial.path.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "serial.path must not be empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(AppError::InvalidConfig(
                "serial.baud_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            max_read_per_tick: self.max_read_per_tick,
            tick_interval_ms: self.tick_interval_ms,
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.client_idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 6638

        [serial]
        path = "/dev/ttyUSB0"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.server.port, 6638);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.tick_interval_ms, 10);
        assert_eq!(config.server.max_read_per_tick, 4096);
        assert_eq!(config.server.idle_timeout(), None);
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::parse(
            r#"
            [server]
            port = 7000
            bind_address = "127.0.0.1"
            tick_interval_ms = 5
            max_read_per_tick = 0
            client_idle_timeout_secs = 30

            [serial]
            path = "/dev/ttyS3"
            baud_rate = 9600

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.server.bridge_config(),
            BridgeConfig {
                max_read_per_tick: 0,
                tick_interval_ms: 5,
            }
        );
        assert_eq!(config.server.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_port_is_parse_error() {
        let result = AppConfig::parse(
            r#"
            [server]
            [serial]
            path = "/dev/ttyUSB0"
            "#,
        );
        assert!(matches!(result, Err(AppError::ConfigParse(_))));
    }

    #[test]
    fn test_out_of_range_port_is_parse_error() {
        let result = AppConfig::parse(
            r#"
            [server]
            port = 70000
            [serial]
            path = "/dev/ttyUSB0"
            "#,
        );
        assert!(matches!(result, Err(AppError::ConfigParse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = AppConfig::parse(MINIMAL).unwrap();

        let mut config = base.clone();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));

        let mut config = base.clone();
        config.server.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));

        let mut config = base.clone();
        config.serial.path = "  ".to_string();
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));

        let mut config = base;
        config.serial.baud_rate = 0;
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/streambridge.toml");
        assert!(matches!(result, Err(AppError::ConfigRead { .. })));
    }
}
