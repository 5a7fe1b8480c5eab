//! Error types
//!
//! Defines the error types for each layer of the server: the acceptor
//! (`ServerError`) and the per-connection protocol engine (`ProtocolError`).

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Acceptor errors, surfaced synchronously from `Server::listen`
#[derive(Debug)]
pub enum ServerError {
    MissingHandler,
    InvalidPort(i32),
    Bind { addr: SocketAddr, source: io::Error },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::MissingHandler => {
                write!(f, "Can't create a server without a connection handler")
            }
            ServerError::InvalidPort(port) => {
                write!(f, "Can't create a server on port {}: must be between 1 and 65535", port)
            }
            ServerError::Bind { addr, source } => {
                write!(f, "Unable to listen on {}: {}", addr, source)
            }
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Per-connection errors. Any of these closes the connection that raised it
/// and nothing else.
#[derive(Debug)]
pub enum ProtocolError {
    Io(io::Error),
    ConnectionClosed,
    UnterminatedLine,
    LineTooLong(usize),
    Timeout(Duration),
    Welcome(String),
    NoDataHandler,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
            ProtocolError::ConnectionClosed => write!(f, "Connection closed by peer"),
            ProtocolError::UnterminatedLine => {
                write!(f, "Stream ended before the line terminator")
            }
            ProtocolError::LineTooLong(max) => {
                write!(f, "Line exceeds the maximum length of {} bytes", max)
            }
            ProtocolError::Timeout(after) => {
                write!(f, "No line received within {:?}", after)
            }
            ProtocolError::Welcome(reason) => write!(f, "Welcome refused: {}", reason),
            ProtocolError::NoDataHandler => {
                write!(f, "Handler entered the data state without a data handler")
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(error: io::Error) -> Self {
        ProtocolError::Io(error)
    }
}
