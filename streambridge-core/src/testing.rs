//! In-memory stream and connection doubles shared by the unit tests

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::string::{String, ToString};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::client::ClientEvents;
use crate::traits::{ByteStream, ClientConnection, NetworkError, StreamError};

pub type TestMutex = CriticalSectionRawMutex;

#[derive(Default)]
struct PeerState {
    events: Option<ClientEvents<TestMutex>>,
    received: Vec<u8>,
    aborted: bool,
    dropped: bool,
}

/// Connection side owned by the bridge
pub struct MockConnection {
    addr: SocketAddr,
    state: Arc<Mutex<PeerState>>,
}

impl MockConnection {
    pub fn new(port: u16) -> (Self, MockPeer) {
        let state = Arc::new(Mutex::new(PeerState::default()));
        let connection = Self {
            addr: SocketAddr::from(([10, 0, 0, 1], port)),
            state: state.clone(),
        };
        (connection, MockPeer { state })
    }
}

impl ClientConnection<TestMutex> for MockConnection {
    fn remote_addr(&self) -> SocketAddr {
        self.addr
    }

    fn attach(&mut self, events: ClientEvents<TestMutex>) {
        self.state.lock().unwrap().events = Some(events);
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, NetworkError> {
        let mut state = self.state.lock().unwrap();
        if state.aborted {
            return Err(NetworkError::ConnectionClosed);
        }
        state.received.extend_from_slice(data);
        Ok(data.len())
    }

    fn abort(&mut self) {
        self.state.lock().unwrap().aborted = true;
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.dropped = true;
        }
    }
}

/// Test-side view of the remote peer
#[derive(Clone)]
pub struct MockPeer {
    state: Arc<Mutex<PeerState>>,
}

impl MockPeer {
    pub fn events(&self) -> ClientEvents<TestMutex> {
        self.state
            .lock()
            .unwrap()
            .events
            .clone()
            .expect("connection was never attached")
    }

    /// Simulate data arriving from the peer
    pub fn send(&self, data: &[u8]) {
        self.events().on_data(data);
    }

    pub fn received(&self) -> Vec<u8> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .events
            .as_ref()
            .is_some_and(|events| events.is_attached())
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().unwrap().aborted
    }

    pub fn is_dropped(&self) -> bool {
        self.state.lock().unwrap().dropped
    }
}

/// Byte stream backed by in-memory queues
#[derive(Default)]
pub struct MemoryStream {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    /// Maximum bytes accepted per `write` call
    pub write_limit: Option<usize>,
    /// Number of upcoming writes that accept nothing
    pub stalled_writes: usize,
    pub fail_writes: bool,
}

impl MemoryStream {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, data: &[u8]) {
        self.input.extend(data.iter().copied());
    }
}

impl ByteStream for MemoryStream {
    fn available(&mut self) -> usize {
        self.input.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let n = buf.len().min(self.input.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        if self.fail_writes {
            return Err(StreamError::WriteFailed);
        }
        if self.stalled_writes > 0 {
            self.stalled_writes -= 1;
            return Ok(0);
        }
        let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.output.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut captured) = CAPTURED.lock() {
                captured.push((record.level(), record.args().to_string()));
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Record debug-and-above log messages for the rest of the test run
pub fn capture_logs() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Debug);
}

/// Level of the first captured record whose message equals `message`
pub fn logged_level(message: &str) -> Option<Level> {
    CAPTURED
        .lock()
        .unwrap()
        .iter()
        .find(|(_, logged)| logged == message)
        .map(|(level, _)| *level)
}
