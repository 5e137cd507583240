//! Error types for the streambridge daemon

use streambridge_core::{BridgeError, NetworkError};

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Daemon-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`AppConfig`](crate::config::AppConfig)
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// TCP listener error
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Bridge loop stopped on a stream error
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}
