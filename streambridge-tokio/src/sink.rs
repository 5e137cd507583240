//! Line sinks for lines framed from the serial stream

use log::info;
use streambridge_core::LineSink;
use tokio::sync::watch;

/// Log target used by [`LogLineSink`]
pub const LINE_LOG_TARGET: &str = "streambridge::line";

/// Logs every line at info level under [`LINE_LOG_TARGET`]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLineSink;

impl LineSink for LogLineSink {
    fn publish(&mut self, line: &str) {
        info!(target: LINE_LOG_TARGET, "{}", line);
    }
}

/// Publishes the latest line on a `tokio::sync::watch` channel
///
/// Receivers only ever observe the most recent line.
#[derive(Debug)]
pub struct WatchLineSink {
    tx: watch::Sender<String>,
}

impl WatchLineSink {
    pub fn new() -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl LineSink for WatchLineSink {
    fn publish(&mut self, line: &str) {
        self.tx.send_replace(line.to_string());
    }
}
