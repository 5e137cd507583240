//! Bridge loop tying the byte stream to the connected clients
//!
//! Every tick runs, in order:
//!
//! 1. Admission of connections offered through the [`Acceptor`]
//! 2. Cleanup of dead clients
//! 3. Read phase: stream bytes are framed into lines and broadcast to every
//!    remaining client, chunk by chunk
//! 4. Write phase: client bytes collected since the last tick are written to
//!    the stream
//!
//! The bridge keeps no state of its own between ticks besides the line
//! framer, the fan-in channel and the outbound backlog.

use alloc::string::String;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, error, info, trace, warn};

use crate::error::BridgeError;
use crate::fan_in::{self, FanInReceiver};
use crate::framer::{LineFramer, DEFAULT_LINE_CAPACITY};
use crate::registry::{Acceptor, ClientRegistry};
use crate::stats::{BridgeStats, TickReport};
use crate::traits::{ByteStream, ClientConnection, Delay, LineSink};

/// Default size of one stream read
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default cap on stream bytes read per tick
pub const DEFAULT_MAX_READ_PER_TICK: usize = 4096;

/// Runtime configuration for the bridge loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Stream bytes read per tick before yielding to the write phase
    /// (0 reads until the stream is empty)
    pub max_read_per_tick: usize,
    /// Pause between ticks in [`Bridge::run`]
    pub tick_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_read_per_tick: DEFAULT_MAX_READ_PER_TICK,
            tick_interval_ms: 10,
        }
    }
}

/// Serial-to-TCP bridge
///
/// # Generic Parameters
///
/// - `C`: Client connection type
/// - `L`: Sink for lines framed from the stream
/// - `M`: Raw mutex guarding the buffers shared with network events
/// - `CHUNK_SIZE`: Maximum bytes per stream read, also the broadcast unit
/// - `LINE_CAPACITY`: Line framer capacity, including the terminator slot
pub struct Bridge<
    C,
    L,
    M,
    const CHUNK_SIZE: usize = DEFAULT_CHUNK_SIZE,
    const LINE_CAPACITY: usize = DEFAULT_LINE_CAPACITY,
> where
    C: ClientConnection<M>,
    L: LineSink,
    M: RawMutex,
{
    registry: ClientRegistry<C, M>,
    inbox: FanInReceiver<M>,
    framer: LineFramer<LINE_CAPACITY>,
    sink: L,
    backlog: Vec<u8>,
    config: BridgeConfig,
    stats: BridgeStats,
}

impl<C, L, M, const CHUNK_SIZE: usize, const LINE_CAPACITY: usize>
    Bridge<C, L, M, CHUNK_SIZE, LINE_CAPACITY>
where
    C: ClientConnection<M>,
    L: LineSink,
    M: RawMutex,
{
    pub fn new(sink: L, config: BridgeConfig) -> Self {
        let (sender, inbox) = fan_in::channel();
        Self {
            registry: ClientRegistry::new(sender),
            inbox,
            framer: LineFramer::new(),
            sink,
            backlog: Vec::new(),
            config,
            stats: BridgeStats::default(),
        }
    }

    /// Handle for the connection-accepted callback
    pub fn acceptor(&self) -> Acceptor<C, M> {
        self.registry.acceptor()
    }

    pub fn registry(&self) -> &ClientRegistry<C, M> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClientRegistry<C, M> {
        &mut self.registry
    }

    pub fn framer(&self) -> &LineFramer<LINE_CAPACITY> {
        &self.framer
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut L {
        &mut self.sink
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Client bytes drained but not yet accepted by the stream
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Run one tick against `stream`
    ///
    /// Stream errors abort the tick and are returned; client bytes that were
    /// not written stay queued for the next tick.
    pub fn tick<S: ByteStream>(&mut self, stream: &mut S) -> Result<TickReport, BridgeError> {
        let mut report = TickReport {
            admitted: self.registry.admit_pending(),
            evicted: self.registry.evict_dead(),
            ..TickReport::default()
        };

        let result = match self.read_phase(stream, &mut report) {
            Ok(()) => self.write_phase(stream, &mut report),
            Err(e) => Err(e),
        };

        report.backlog = self.backlog.len();
        self.stats.record(&report);
        self.stats.line_bytes_dropped = self.framer.dropped_bytes() as u64;

        result.map(|()| report)
    }

    fn read_phase<S: ByteStream>(
        &mut self,
        stream: &mut S,
        report: &mut TickReport,
    ) -> Result<(), BridgeError> {
        let budget = match self.config.max_read_per_tick {
            0 => usize::MAX,
            max => max,
        };
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            let available = stream.available();
            if available == 0 {
                return Ok(());
            }
            if report.bytes_read >= budget {
                debug!(
                    "Read budget of {} bytes reached, {} bytes left for next tick",
                    budget, available
                );
                self.stats.read_budget_exhausted += 1;
                return Ok(());
            }

            let want = available.min(CHUNK_SIZE).min(budget - report.bytes_read);
            let len = stream.read(&mut buf[..want])?.min(want);
            if len == 0 {
                return Ok(());
            }
            let chunk = &buf[..len];

            for &byte in chunk {
                if let Some(line) = self.framer.feed(byte) {
                    let line = String::from_utf8_lossy(&line);
                    trace!("Publishing line: {}", line);
                    self.sink.publish(&line);
                    report.lines += 1;
                }
            }

            self.registry.broadcast(chunk);
            report.bytes_read += len;
        }
    }

    fn write_phase<S: ByteStream>(
        &mut self,
        stream: &mut S,
        report: &mut TickReport,
    ) -> Result<(), BridgeError> {
        let drained = self.inbox.drain_into(&mut self.backlog);
        if drained > 0 {
            trace!("Drained {} bytes from clients", drained);
        }

        while !self.backlog.is_empty() {
            let written = stream.write(&self.backlog)?.min(self.backlog.len());
            if written == 0 {
                warn!(
                    "Stream accepted no data, holding {} bytes for next tick",
                    self.backlog.len()
                );
                break;
            }
            self.backlog.drain(..written);
            report.bytes_written += written;
        }
        Ok(())
    }

    /// Tick forever, sleeping `tick_interval_ms` between ticks
    ///
    /// Returns the first stream error.
    pub async fn run<S, D>(&mut self, stream: &mut S, delay: &D) -> Result<(), BridgeError>
    where
        S: ByteStream,
        D: Delay,
    {
        info!(
            "Starting bridge loop (tick interval {} ms)",
            self.config.tick_interval_ms
        );
        loop {
            match self.tick(stream) {
                Ok(report) if !report.is_idle() => trace!("Tick: {:?}", report),
                Ok(_) => {}
                Err(e) => {
                    error!("Bridge loop stopped: {}", e);
                    return Err(e);
                }
            }
            delay.sleep_ms(self.config.tick_interval_ms).await;
        }
    }

    /// Reset every client connection, used once on teardown
    pub fn shutdown(&mut self) -> usize {
        // Connections still waiting in the acceptor get reset as well
        self.registry.admit_pending();
        let closed = self.registry.shutdown_all();
        info!("Bridge shut down, closed {} clients", closed);
        closed
    }
}
