//! Serial port stream

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use log::{debug, info, warn};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use streambridge_core::{ByteStream, StreamError};

use crate::error::Result;

/// UART exposed as a [`ByteStream`]
///
/// Reads and writes use a very short port timeout so a tick never waits on
/// the device; a timeout is reported as zero bytes moved.
pub struct SerialStream {
    port: Box<dyn SerialPort>,
    path: String,
    available_failed: bool,
}

impl SerialStream {
    /// Open a serial port at 8N1 without flow control
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_micros(100))
            .open()?;

        info!("Opened serial port: {} at {} baud", path, baud_rate);
        Ok(Self::from_port(port, path))
    }

    /// Wrap an already configured port
    pub fn from_port(port: Box<dyn SerialPort>, path: &str) -> Self {
        Self {
            port,
            path: path.to_string(),
            available_failed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ByteStream for SerialStream {
    fn available(&mut self) -> usize {
        match self.port.bytes_to_read() {
            Ok(n) => {
                self.available_failed = false;
                n as usize
            }
            Err(e) => {
                if !self.available_failed {
                    warn!("Failed to query {}: {}", self.path, e);
                    self.available_failed = true;
                }
                0
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, StreamError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => {
                debug!("Read from {} failed: {}", self.path, e);
                Err(StreamError::ReadFailed)
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::result::Result<usize, StreamError> {
        match self.port.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => {
                debug!("Write to {} failed: {}", self.path, e);
                Err(StreamError::WriteFailed)
            }
        }
    }
}
