//! Server options
//!
//! Settings applied by the acceptor when it binds and admits connections.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Acceptor options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    /// Address the listening socket binds to
    pub bind_address: IpAddr,
    /// Upper bound on simultaneously open connections
    pub max_connections: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerOptions {
    /// Socket address for the given port on the bind address
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.bind_address, port)
    }
}
