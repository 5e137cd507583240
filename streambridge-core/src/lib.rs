//! # StreamBridge Core
//!
//! Runtime-agnostic core of a serial-to-TCP bridge.
//!
//! Bytes read from a single byte stream (typically a UART) are broadcast to
//! every connected TCP client, and bytes received from any client are merged
//! into one outbound queue that is written back to the stream. A line framer
//! watches the inbound stream and publishes every `\r`-terminated line to a
//! side channel.
//!
//! ## Features
//!
//! - **no_std + alloc** - No runtime or standard library dependency
//! - **Tick driven** - The caller invokes [`Bridge::tick`] periodically
//! - **Generic networking** - Works with any TCP implementation through
//!   [`ClientConnection`]
//! - **Generic locking** - Shared buffers are guarded by any
//!   `embassy_sync` raw mutex
//!
//! ## Limitations
//!
//! - No authentication or encryption
//! - No backpressure: data a slow client cannot take is dropped
//! - Data written to a client after it disconnected is silently lost

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bridge;
pub mod client;
pub mod error;
pub mod fan_in;
pub mod framer;
pub mod registry;
pub mod stats;
pub mod traits;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, BridgeConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_READ_PER_TICK};
pub use client::{Client, ClientEvents};
pub use error::BridgeError;
pub use fan_in::{FanInReceiver, FanInSender};
pub use framer::{Line, LineFramer, DEFAULT_LINE_CAPACITY};
pub use registry::{Acceptor, ClientRegistry};
pub use stats::{BridgeStats, TickReport};
pub use traits::{ByteStream, ClientConnection, Delay, LineSink, NetworkError, StreamError};

pub use embassy_sync::blocking_mutex::raw::RawMutex;
