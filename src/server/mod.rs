//! Connection acceptor
//!
//! Owns the listening socket, the accept loop and the bounded registry of
//! active connections.

pub mod config;
pub mod connection;
pub mod core;
pub mod registry;

pub use self::config::ServerOptions;
pub use connection::Connection;
pub use self::core::{Server, ServerHandler};
pub use registry::{ConnectionId, ConnectionRegistry, Refusal};
