//! Client handle for one accepted TCP connection

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, trace};

use crate::fan_in::FanInSender;
use crate::traits::{ClientConnection, NetworkError};

/// State shared between a [`Client`] and the transport's event sink
struct ClientLink<M: RawMutex> {
    disconnected: AtomicBool,
    attached: AtomicBool,
    inbox: FanInSender<M>,
}

impl<M: RawMutex> ClientLink<M> {
    fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::Release);
    }
}

/// Event sink handed to the transport on [`ClientConnection::attach`]
///
/// Cheap to clone and safe to use from any task or thread. Once the owning
/// [`Client`] is dropped the sink is detached and data events are ignored.
pub struct ClientEvents<M: RawMutex> {
    link: Arc<ClientLink<M>>,
}

impl<M: RawMutex> Clone for ClientEvents<M> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
        }
    }
}

impl<M: RawMutex> ClientEvents<M> {
    /// Data received from the peer
    pub fn on_data(&self, data: &[u8]) {
        if data.is_empty() || !self.is_attached() {
            return;
        }
        self.link.inbox.send(data);
    }

    /// Transport error, the connection is considered dead
    pub fn on_error(&self, error: NetworkError) {
        debug!("Client connection error: {}", error);
        self.link.mark_disconnected();
    }

    /// Peer closed the connection
    pub fn on_disconnect(&self) {
        self.link.mark_disconnected();
    }

    /// No activity within the transport's timeout
    pub fn on_timeout(&self, idle: Duration) {
        debug!("Client connection idle for {} ms", idle.as_millis());
        self.link.mark_disconnected();
    }

    /// Whether the owning client still exists
    pub fn is_attached(&self) -> bool {
        self.link.attached.load(Ordering::Acquire)
    }
}

/// One connected TCP peer
///
/// Owns its connection exclusively. The `disconnected` flag only ever goes
/// from false to true.
pub struct Client<C, M>
where
    C: ClientConnection<M>,
    M: RawMutex,
{
    connection: C,
    identifier: String,
    link: Arc<ClientLink<M>>,
}

impl<C, M> Client<C, M>
where
    C: ClientConnection<M>,
    M: RawMutex,
{
    /// Wrap an accepted connection and register its event sink
    pub fn new(mut connection: C, inbox: FanInSender<M>) -> Self {
        let identifier = connection.remote_addr().to_string();
        debug!("New client connected from {}", identifier);

        let link = Arc::new(ClientLink {
            disconnected: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            inbox,
        });
        connection.attach(ClientEvents { link: link.clone() });

        Self {
            connection,
            identifier,
            link,
        }
    }

    /// Remote address captured at acceptance
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_disconnected(&self) -> bool {
        self.link.disconnected.load(Ordering::Acquire)
    }

    /// Best-effort write, delivery is not confirmed
    ///
    /// Returns how many bytes the transport accepted; anything else is dropped.
    pub fn write(&mut self, data: &[u8]) -> usize {
        match self.connection.write(data) {
            Ok(accepted) => accepted,
            Err(e) => {
                trace!("Dropped {} bytes for client {}: {}", data.len(), self.identifier, e);
                0
            }
        }
    }

    /// Reset the connection and mark the client dead
    pub fn abort(&mut self) {
        self.connection.abort();
        self.link.mark_disconnected();
    }
}

impl<C, M> Drop for Client<C, M>
where
    C: ClientConnection<M>,
    M: RawMutex,
{
    fn drop(&mut self) {
        // Detach before the connection field is dropped
        self.link.attached.store(false, Ordering::Release);
    }
}
