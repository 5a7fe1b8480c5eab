//! Admitted connections
//!
//! A `Connection` owns the accepted stream and keeps a weak back-reference
//! to the registry of its server. Closing it removes the registry entry
//! first and only then shuts the stream down.

use log::{debug, info};
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{ReadHalf, WriteHalf};

use crate::server::registry::{ConnectionId, ConnectionRegistry};

pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
    registry: Weak<ConnectionRegistry>,
    released: bool,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        stream: TcpStream,
        peer: SocketAddr,
        registry: &Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            id,
            peer,
            stream,
            registry: Arc::downgrade(registry),
            released: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Borrows the stream as separate read and write halves.
    pub fn split(&mut self) -> (ReadHalf<'_>, WriteHalf<'_>) {
        self.stream.split()
    }

    /// Releases the registry slot, then shuts the stream down.
    pub async fn close(mut self) {
        self.release();

        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.peer, e);
        }

        info!("Connection closed for {}", self.peer);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn accepted_pair() -> (TcpStream, TcpStream, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (client, server, peer)
    }

    #[tokio::test]
    async fn test_close_releases_slot_and_stream() {
        let registry = Arc::new(ConnectionRegistry::new(1));
        let (mut client, server, peer) = accepted_pair().await;

        let id = registry.admit().unwrap();
        let conn = Connection::new(id, server, peer, &registry);
        assert_eq!(conn.id(), id);
        assert_eq!(registry.len(), 1);

        conn.close().await;
        assert!(registry.is_empty());

        let mut buf = [0u8; 8];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_slot() {
        let registry = Arc::new(ConnectionRegistry::new(1));
        let (_client, server, peer) = accepted_pair().await;

        let id = registry.admit().unwrap();
        drop(Connection::new(id, server, peer, &registry));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_close_after_external_removal() {
        let registry = Arc::new(ConnectionRegistry::new(2));
        let (_client, server, peer) = accepted_pair().await;

        let id = registry.admit().unwrap();
        let other = registry.admit().unwrap();
        let conn = Connection::new(id, server, peer, &registry);

        assert!(registry.remove(id));
        conn.close().await;

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(other));
    }

    #[tokio::test]
    async fn test_close_after_registry_dropped() {
        let registry = Arc::new(ConnectionRegistry::new(1));
        let (_client, server, peer) = accepted_pair().await;

        let id = registry.admit().unwrap();
        let conn = Connection::new(id, server, peer, &registry);
        drop(registry);
        conn.close().await;
    }
}
