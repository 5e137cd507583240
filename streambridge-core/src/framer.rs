//! Line framer for the inbound stream
//!
//! Splits the raw byte stream into `\r`-terminated lines. `\n` is ignored so
//! CRLF and LF-less sources frame the same way. The accumulator has a fixed
//! capacity; bytes that do not fit are dropped and counted.

use heapless::Vec as HeaplessVec;
use log::warn;

/// Default line capacity, including the terminator slot
pub const DEFAULT_LINE_CAPACITY: usize = 80;

/// A complete line, without its terminator
pub type Line<const CAPACITY: usize> = HeaplessVec<u8, CAPACITY>;

/// Stateful byte-to-line decoder
///
/// A line holds at most `CAPACITY - 1` bytes; one slot is reserved for the
/// terminator.
#[derive(Debug, Default, Clone)]
pub struct LineFramer<const CAPACITY: usize = DEFAULT_LINE_CAPACITY> {
    line: HeaplessVec<u8, CAPACITY>,
    truncated: usize,
    dropped: usize,
}

impl<const CAPACITY: usize> LineFramer<CAPACITY> {
    pub const fn new() -> Self {
        Self {
            line: HeaplessVec::new(),
            truncated: 0,
            dropped: 0,
        }
    }

    /// Maximum number of bytes kept per line
    pub const fn max_line_len() -> usize {
        CAPACITY.saturating_sub(1)
    }

    /// Consume one byte, returning the completed line on `\r`
    pub fn feed(&mut self, byte: u8) -> Option<Line<CAPACITY>> {
        match byte {
            b'\n' => None,
            b'\r' => {
                if self.truncated > 0 {
                    warn!(
                        "Line exceeded {} bytes, dropped {} bytes",
                        Self::max_line_len(),
                        self.truncated
                    );
                    self.truncated = 0;
                }
                Some(core::mem::take(&mut self.line))
            }
            _ => {
                if self.line.len() < Self::max_line_len() {
                    // Cannot fail, length checked against capacity above
                    let _ = self.line.push(byte);
                } else {
                    self.truncated += 1;
                    self.dropped += 1;
                }
                None
            }
        }
    }

    /// Bytes of the line currently being accumulated
    pub fn pending(&self) -> &[u8] {
        &self.line
    }

    /// Total number of bytes dropped because a line was full
    pub fn dropped_bytes(&self) -> usize {
        self.dropped
    }

    /// Discard the line in progress
    pub fn reset(&mut self) {
        self.line.clear();
        self.truncated = 0;
    }
}
