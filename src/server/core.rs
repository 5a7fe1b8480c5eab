use async_trait::async_trait;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::ServerError;
use crate::server::config::ServerOptions;
use crate::server::connection::Connection;
use crate::server::registry::ConnectionRegistry;

/// Pause after a failed accept so a persistent error does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Handles the connections admitted by a `Server`.
#[async_trait]
pub trait ServerHandler: Send + Sync + 'static {
    /// Invoked on a freshly spawned task for every admitted connection. The
    /// connection is expected to be closed (or dropped) when this returns.
    async fn on_accepted(&self, conn: Connection);
}

/// A listening server.
///
/// The accept loop runs on its own task; every admitted connection runs on a
/// task of its own.
pub struct Server {
    address: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<Notify>,
    accept_task: JoinHandle<()>,
}

impl Server {
    /// Starts listening on `port` of every interface with default options.
    pub async fn listen<H>(port: i32, handler: Option<Arc<H>>) -> Result<Self, ServerError>
    where
        H: ServerHandler,
    {
        Self::listen_with(port, handler, ServerOptions::default()).await
    }

    /// Starts listening on `port` and returns as soon as the socket is bound.
    ///
    /// Fails without creating a socket if `handler` is `None` or if `port`
    /// is not a valid, non-zero port.
    pub async fn listen_with<H>(
        port: i32,
        handler: Option<Arc<H>>,
        options: ServerOptions,
    ) -> Result<Self, ServerError>
    where
        H: ServerHandler,
    {
        let Some(handler) = handler else {
            return Err(ServerError::MissingHandler);
        };
        let handler: Arc<dyn ServerHandler> = handler;

        let valid_port = u16::try_from(port)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(ServerError::InvalidPort(port))?;

        let addr = options.socket_addr(valid_port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let address = listener.local_addr().unwrap_or(addr);

        info!(
            "Server bound to {} (max {} connections)",
            address, options.max_connections
        );

        let registry = Arc::new(ConnectionRegistry::new(options.max_connections));
        let shutdown = Arc::new(Notify::new());

        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&registry),
            handler,
            Arc::clone(&shutdown),
        ));

        Ok(Self {
            address,
            registry,
            shutdown,
            accept_task,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Number of connections currently registered
    pub fn active_connections(&self) -> usize {
        self.registry.len()
    }

    pub fn max_connections(&self) -> usize {
        self.registry.max_connections()
    }

    pub fn is_stopped(&self) -> bool {
        self.registry.is_stopped()
    }

    /// Stops accepting connections and closes the listening socket.
    ///
    /// Connections that are already open are left to finish on their own.
    pub async fn stop(mut self) {
        info!("Stopping server on {}", self.address);

        self.signal_stop();

        if let Err(e) = (&mut self.accept_task).await {
            error!("Accept loop for {} ended abnormally: {}", self.address, e);
        }
    }

    fn signal_stop(&self) {
        self.registry.stop();
        self.shutdown.notify_one();
    }
}

impl Drop for Server {
    // a dropped server must not leave its accept loop running
    fn drop(&mut self) {
        if !self.accept_task.is_finished() {
            self.signal_stop();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    handler: Arc<dyn ServerHandler>,
    shutdown: Arc<Notify>,
) {
    info!("Start serving requests");

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.notified() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Unable to accept a connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            },
        };

        // admission happens before the spawn, so the task count is bounded too
        let Some(conn) = admit(&registry, stream, peer) else {
            continue;
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            info!("Accept connection from {} ({})", peer, conn.id());
            handler.on_accepted(conn).await;
        });
    }

    // dropping the listener closes the socket
    drop(listener);
    info!("Stopped accepting connections");
}

fn admit(
    registry: &Arc<ConnectionRegistry>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Option<Connection> {
    match registry.admit() {
        Ok(id) => Some(Connection::new(id, stream, peer, registry)),
        Err(refusal) => {
            info!("Refuse connection from {}: {}", peer, refusal);
            drop(stream);
            None
        }
    }
}
