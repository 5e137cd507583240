//! Tokio networking implementation
//!
//! Each accepted socket is shared between the bridge-side
//! [`TokioConnection`] and two tasks: a reader that forwards received bytes
//! to the client's event sink, and a writer that drains a bounded outbound
//! queue. Chunks offered while the queue is full are dropped.
//! Both use readiness-based I/O on a shared `TcpStream`, so the bridge can
//! still reset the socket while the tasks run.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, error, info, trace, warn};
use streambridge_core::{Acceptor, ClientConnection, ClientEvents, NetworkError};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::BridgeMutex;

const READ_BUFFER_SIZE: usize = 1024;

/// Chunks queued per connection before further writes are dropped
pub const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// One accepted TCP connection
pub struct TokioConnection {
    stream: Arc<TcpStream>,
    remote: SocketAddr,
    idle_timeout: Option<Duration>,
    runtime: Handle,
    outbound: Option<mpsc::Sender<Bytes>>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl TokioConnection {
    /// Wrap an accepted stream
    ///
    /// Must be called from within a Tokio runtime; the I/O tasks are spawned
    /// on it when the connection is attached.
    pub fn new(stream: TcpStream, remote: SocketAddr, idle_timeout: Option<Duration>) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", remote, e);
        }
        Self {
            stream: Arc::new(stream),
            remote,
            idle_timeout,
            runtime: Handle::current(),
            outbound: None,
            reader: None,
            writer: None,
        }
    }

    fn stop_tasks(&mut self) {
        self.outbound = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
    }
}

impl ClientConnection<BridgeMutex> for TokioConnection {
    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn attach(&mut self, events: ClientEvents<BridgeMutex>) {
        if self.reader.is_some() {
            warn!("Connection {} attached twice, ignoring", self.remote);
            return;
        }

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        self.outbound = Some(tx);
        self.reader = Some(self.runtime.spawn(read_task(
            self.stream.clone(),
            events.clone(),
            self.idle_timeout,
        )));
        self.writer = Some(self.runtime.spawn(write_task(self.stream.clone(), rx, events)));
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, NetworkError> {
        let outbound = self.outbound.as_ref().ok_or(NetworkError::ConnectionClosed)?;
        match outbound.try_send(Bytes::copy_from_slice(data)) {
            Ok(()) => Ok(data.len()),
            Err(TrySendError::Full(_)) => {
                trace!("Outbound queue for {} full, dropped {} bytes", self.remote, data.len());
                Ok(0)
            }
            Err(TrySendError::Closed(_)) => Err(NetworkError::ConnectionClosed),
        }
    }

    fn abort(&mut self) {
        // A zero linger turns the final close into a reset
        #[allow(deprecated)]
        let linger = self.stream.set_linger(Some(Duration::ZERO));
        if let Err(e) = linger {
            debug!("Failed to set linger for {}: {}", self.remote, e);
        }
        self.stop_tasks();
    }
}

impl Drop for TokioConnection {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

async fn read_task(
    stream: Arc<TcpStream>,
    events: ClientEvents<BridgeMutex>,
    idle_timeout: Option<Duration>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let ready = match idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, stream.readable()).await {
                Ok(ready) => ready,
                Err(_) => {
                    events.on_timeout(idle);
                    return;
                }
            },
            None => stream.readable().await,
        };
        if let Err(e) = ready {
            debug!("Readiness error: {}", e);
            events.on_error(NetworkError::IoError);
            return;
        }

        match stream.try_read(&mut buf) {
            Ok(0) => {
                events.on_disconnect();
                return;
            }
            Ok(n) => {
                trace!("Received {} bytes", n);
                events.on_data(&buf[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => {
                debug!("Read error: {}", e);
                events.on_error(NetworkError::IoError);
                return;
            }
        }
    }
}

async fn write_task(
    stream: Arc<TcpStream>,
    mut outbound: mpsc::Receiver<Bytes>,
    events: ClientEvents<BridgeMutex>,
) {
    while let Some(data) = outbound.recv().await {
        if let Err(e) = write_all(&stream, &data).await {
            debug!("Write error: {}", e);
            events.on_error(NetworkError::IoError);
            return;
        }
    }
}

async fn write_all(stream: &TcpStream, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        stream.writable().await?;
        match stream.try_write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Tokio TCP listener producing [`TokioConnection`]s
pub struct TokioListener {
    inner: TcpListener,
    idle_timeout: Option<Duration>,
}

impl TokioListener {
    /// Bind to `address:port`
    pub async fn bind(address: &str, port: u16) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind((address, port)).await.map_err(|e| {
            error!("Failed to bind {}:{}: {}", address, port, e);
            NetworkError::BindError
        })?;

        Ok(TokioListener {
            inner: listener,
            idle_timeout: None,
        })
    }

    /// Idle timeout applied to every connection accepted from now on
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.inner.local_addr().map_err(|_| NetworkError::IoError)
    }

    /// Accept the next connection
    pub async fn accept(&self) -> Result<TokioConnection, NetworkError> {
        let (stream, remote) = self.inner.accept().await.map_err(|e| {
            error!("Error accepting connection: {}", e);
            NetworkError::AcceptError
        })?;
        Ok(TokioConnection::new(stream, remote, self.idle_timeout))
    }

    /// Accept forever, offering each connection to the bridge
    pub fn spawn_accept_loop(
        self,
        acceptor: Acceptor<TokioConnection, BridgeMutex>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Ok(addr) = self.local_addr() {
                info!("Accepting incoming connections on {}...", addr);
            }
            loop {
                match self.accept().await {
                    Ok(connection) => {
                        debug!("Accepted connection from {}", connection.remote_addr());
                        acceptor.offer(Some(connection));
                    }
                    Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            }
        })
    }
}
