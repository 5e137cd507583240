use std::future::Future;
use std::net::SocketAddr;

use log::{debug, info};
use streambridge_core::{Bridge, BridgeStats, ByteStream, LineSink};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::network::{TokioConnection, TokioListener};
use crate::time::TokioDelay;
use crate::BridgeMutex;

/// Bridge over Tokio TCP connections
pub type TokioBridge<L> = Bridge<TokioConnection, L, BridgeMutex>;

/// Serial-to-TCP server: a TCP listener feeding one bridge loop
pub struct StreamServer<L: LineSink> {
    listener: TokioListener,
    bridge: TokioBridge<L>,
}

impl<L: LineSink> StreamServer<L> {
    /// Bind the listener described by `config`
    pub async fn bind(config: &ServerConfig, sink: L) -> Result<Self> {
        let listener = TokioListener::bind(&config.bind_address, config.port)
            .await?
            .with_idle_timeout(config.idle_timeout());
        Ok(Self {
            listener,
            bridge: Bridge::new(sink, config.bridge_config()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn bridge(&self) -> &TokioBridge<L> {
        &self.bridge
    }

    /// Log the effective listening address and loop settings
    pub fn dump_config(&self) {
        info!("Stream Server:");
        match self.listener.local_addr() {
            Ok(addr) => info!("  Address: {}", addr),
            Err(e) => info!("  Address: unknown ({})", e),
        }
        let config = self.bridge.config();
        info!("  Tick interval: {} ms", config.tick_interval_ms);
        match config.max_read_per_tick {
            0 => info!("  Read budget: unlimited"),
            max => info!("  Read budget: {} bytes per tick", max),
        }
    }

    /// Bridge `stream` until it fails or `shutdown` resolves
    ///
    /// Every client is reset before returning. Returns the final counters.
    pub async fn run<S, F>(self, stream: &mut S, shutdown: F) -> Result<BridgeStats>
    where
        S: ByteStream,
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            mut bridge,
        } = self;
        let accept_task = listener.spawn_accept_loop(bridge.acceptor());

        let result = tokio::select! {
            result = bridge.run(stream, &TokioDelay) => result,
            () = shutdown => {
                info!("Shutdown requested");
                Ok(())
            }
        };

        accept_task.abort();
        bridge.shutdown();

        let stats = *bridge.stats();
        debug!("Final bridge stats: {:?}", stats);
        result?;
        Ok(stats)
    }
}
