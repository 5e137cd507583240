use core::net::SocketAddr;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::client::ClientEvents;

/// Byte-oriented duplex stream the bridge relays (usually a UART)
///
/// The bridge never owns the stream, it borrows it for one tick at a time.
pub trait ByteStream {
    /// Number of bytes that can be read right now, 0 if none
    fn available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes, returning how many were read
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Write as much of `buf` as the stream accepts, returning how many bytes
    /// were taken
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;
}

/// One accepted TCP connection as seen by the bridge
pub trait ClientConnection<M: RawMutex> {
    /// Address of the remote peer
    fn remote_addr(&self) -> SocketAddr;

    /// Register the event sink for this connection
    ///
    /// Called exactly once, when the connection is wrapped in a
    /// [`Client`](crate::client::Client). The transport reports received
    /// data, errors, peer disconnects and timeouts through `events`, from any
    /// task or thread.
    fn attach(&mut self, events: ClientEvents<M>);

    /// Queue `data` for transmission without waiting for delivery
    fn write(&mut self, data: &[u8]) -> Result<usize, NetworkError>;

    /// Close the connection abruptly (reset)
    fn abort(&mut self);
}

/// Receiver of complete lines extracted from the inbound stream
pub trait LineSink {
    /// Publish one complete line
    fn publish(&mut self, line: &str);
}

impl<F> LineSink for F
where
    F: FnMut(&str),
{
    fn publish(&mut self, line: &str) {
        self(line)
    }
}

/// Delay trait for abstracting sleep/delay functionality
#[allow(async_fn_in_trait)]
pub trait Delay {
    /// Async sleep for the specified duration in milliseconds
    async fn sleep_ms(&self, millis: u64);
}

/// Network error enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Failed to bind to the specified address
    BindError,
    /// Failed to accept an incoming connection
    AcceptError,
    /// I/O error occurred
    IoError,
    /// Connection closed by peer or already torn down
    ConnectionClosed,
    /// Connection idle for longer than the configured timeout
    TimedOut,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NetworkError::BindError => write!(f, "Failed to bind to the specified address"),
            NetworkError::AcceptError => write!(f, "Failed to accept connection"),
            NetworkError::IoError => write!(f, "I/O error occurred"),
            NetworkError::ConnectionClosed => write!(f, "Connection closed"),
            NetworkError::TimedOut => write!(f, "Connection timed out"),
        }
    }
}

impl core::error::Error for NetworkError {}

/// Stream error enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Reading from the stream failed
    ReadFailed,
    /// Writing to the stream failed
    WriteFailed,
    /// The stream is closed
    Closed,
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StreamError::ReadFailed => write!(f, "Failed to read from stream"),
            StreamError::WriteFailed => write!(f, "Failed to write to stream"),
            StreamError::Closed => write!(f, "Stream closed"),
        }
    }
}

impl core::error::Error for StreamError {}
