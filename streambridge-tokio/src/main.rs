//! streambridge - serial-to-TCP bridge daemon
//!
//! Every byte read from the serial port is sent to all connected TCP
//! clients, and bytes from any client are written back to the port.
//! Complete `\r`-terminated lines from the port are also logged under the
//! `streambridge::line` target.

use std::env;

use streambridge_tokio::config::AppConfig;
use streambridge_tokio::{AppError, LogLineSink, SerialStream, StreamServer};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `streambridge <path>` (positional)
/// - `streambridge --config <path>` (flag-based)
/// - `streambridge -c <path>` (short flag)
///
/// Defaults to `/etc/streambridge.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/streambridge.toml".to_string()
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = parse_config_path();
    let config = AppConfig::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("streambridge v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);

    let mut serial = SerialStream::open(&config.serial.path, config.serial.baud_rate)?;
    let server = StreamServer::bind(&config.server, LogLineSink).await?;
    server.dump_config();

    log::info!("streambridge running. Press Ctrl-C to stop.");
    let stats = server
        .run(&mut serial, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;

    log::info!(
        "Stopped after {} ticks: {} bytes in, {} bytes out, {} lines, {} clients",
        stats.ticks,
        stats.bytes_from_stream,
        stats.bytes_to_stream,
        stats.lines_published,
        stats.clients_admitted
    );
    Ok(())
}
