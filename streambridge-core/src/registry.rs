//! Client registry
//!
//! Holds the active clients in admission order, admits new connections,
//! reaps dead clients once per tick and fans data out to the rest.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{debug, info, trace};

use crate::client::Client;
use crate::fan_in::FanInSender;
use crate::traits::ClientConnection;

/// Thread-safe admission handle for the connection-accepted callback
///
/// Connections offered here are moved into the registry by
/// [`ClientRegistry::admit_pending`] at the start of the next tick.
pub struct Acceptor<C, M: RawMutex> {
    pending: Arc<Mutex<M, RefCell<Vec<C>>>>,
}

impl<C, M: RawMutex> Clone for Acceptor<C, M> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
        }
    }
}

impl<C, M: RawMutex> Acceptor<C, M> {
    /// Queue an accepted connection; `None` is ignored
    pub fn offer(&self, connection: Option<C>) -> bool {
        match connection {
            Some(connection) => {
                self.pending.lock(|pending| pending.borrow_mut().push(connection));
                true
            }
            None => false,
        }
    }
}

/// Manages the set of connected clients
pub struct ClientRegistry<C, M>
where
    C: ClientConnection<M>,
    M: RawMutex,
{
    clients: Vec<Client<C, M>>,
    inbox: FanInSender<M>,
    pending: Arc<Mutex<M, RefCell<Vec<C>>>>,
}

impl<C, M> ClientRegistry<C, M>
where
    C: ClientConnection<M>,
    M: RawMutex,
{
    /// Create an empty registry whose clients append to `inbox`
    pub fn new(inbox: FanInSender<M>) -> Self {
        Self {
            clients: Vec::new(),
            inbox,
            pending: Arc::new(Mutex::new(RefCell::new(Vec::new()))),
        }
    }

    /// Handle for admitting connections from another context
    pub fn acceptor(&self) -> Acceptor<C, M> {
        Acceptor {
            pending: self.pending.clone(),
        }
    }

    /// Wrap a newly accepted connection and append it
    ///
    /// Returns false for a `None` connection, which leaves the registry as is.
    pub fn admit(&mut self, connection: Option<C>) -> bool {
        let Some(connection) = connection else {
            return false;
        };
        self.clients.push(Client::new(connection, self.inbox.clone()));
        true
    }

    /// Admit every connection offered through an [`Acceptor`], in offer order
    pub fn admit_pending(&mut self) -> usize {
        let pending = self
            .pending
            .lock(|pending| core::mem::take(&mut *pending.borrow_mut()));
        let admitted = pending.len();
        for connection in pending {
            self.admit(Some(connection));
        }
        admitted
    }

    /// Drop every disconnected client, keeping the order of the others
    ///
    /// Each flag is read exactly once, so a client flagged while this runs is
    /// either evicted now or on the next call.
    pub fn evict_dead(&mut self) -> usize {
        let (live, dead): (Vec<_>, Vec<_>) = core::mem::take(&mut self.clients)
            .into_iter()
            .partition(|client| !client.is_disconnected());
        self.clients = live;

        for client in &dead {
            debug!("Client {} disconnected", client.identifier());
        }
        dead.len()
    }

    /// Visit every remaining client once, in registry order
    pub fn for_each_live<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Client<C, M>),
    {
        for client in self.clients.iter_mut() {
            f(client);
        }
    }

    /// Write `data` verbatim to every remaining client
    pub fn broadcast(&mut self, data: &[u8]) -> usize {
        let mut reached = 0;
        self.for_each_live(|client| {
            client.write(data);
            reached += 1;
        });
        trace!("Broadcast {} bytes to {} clients", data.len(), reached);
        reached
    }

    /// Reset every connection and empty the registry
    pub fn shutdown_all(&mut self) -> usize {
        let closed = self.clients.len();
        for mut client in self.clients.drain(..) {
            info!("Closing client {}", client.identifier());
            client.abort();
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Identifiers of the current clients, in registry order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(|client| client.identifier())
    }
}
