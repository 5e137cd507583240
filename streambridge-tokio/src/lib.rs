//! # StreamBridge Tokio
//!
//! Tokio runtime support for StreamBridge.
//!
//! This crate provides the TCP connection and listener, serial port stream,
//! delay and line sinks for the standard library using Tokio, plus the TOML
//! configuration and server wiring used by the `streambridge` binary. It
//! re-exports all types from `streambridge-core` for convenience.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! streambridge-tokio = "0.1"
//! ```
//!
//! ```rust,no_run
//! use streambridge_tokio::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = AppConfig::load("/etc/streambridge.toml")?;
//!     let mut serial = SerialStream::open(&config.serial.path, config.serial.baud_rate)?;
//!     let server = StreamServer::bind(&config.server, LogLineSink).await?;
//!     server.run(&mut serial, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod serial;
pub mod server;
pub mod sink;
pub mod time;

// Re-export core for convenience
pub use streambridge_core::*;

// Tokio-specific types
pub use config::AppConfig;
pub use error::AppError;
pub use network::{TokioConnection, TokioListener};
pub use serial::SerialStream;
pub use server::{StreamServer, TokioBridge};
pub use sink::{LogLineSink, WatchLineSink, LINE_LOG_TARGET};
pub use time::TokioDelay;

/// Raw mutex guarding the buffers shared with connection tasks
pub type BridgeMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
