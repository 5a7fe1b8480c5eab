//! Protocol engine
//!
//! Drives the request/response cycle of one connection:
//!
//! - the welcome callback provides the first response and the handler;
//! - each response is written and flushed, then its next state decides
//!   whether to quit, read one request line, or let the handler consume a
//!   data block;
//! - the cycle repeats until a response asks to quit or an I/O error occurs.
//!
//! The handler, not the engine, decides the state transitions, so the same
//! engine serves one-line-in/one-line-out protocols and protocols with
//! multi-line input blocks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::ProtocolError;
use crate::protocol::handler::WelcomeResult;
use crate::protocol::response::State;
use crate::protocol::transport::Request;
use crate::server::{Connection, ServerHandler};

const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Per-connection limits applied by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelnetOptions {
    /// Longest accepted line, terminator excluded
    pub max_line_length: usize,
    /// How long to wait for a line before giving up on the peer
    pub read_timeout: Option<Duration>,
}

impl Default for TelnetOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            read_timeout: None,
        }
    }
}

type WelcomeFn = dyn Fn() -> WelcomeResult + Send + Sync;

/// A `ServerHandler` running the line protocol engine on every accepted
/// connection.
pub struct TelnetServer {
    welcome: Arc<WelcomeFn>,
    options: TelnetOptions,
}

impl TelnetServer {
    pub fn new<F>(welcome: F) -> Self
    where
        F: Fn() -> WelcomeResult + Send + Sync + 'static,
    {
        Self::with_options(welcome, TelnetOptions::default())
    }

    pub fn with_options<F>(welcome: F, options: TelnetOptions) -> Self
    where
        F: Fn() -> WelcomeResult + Send + Sync + 'static,
    {
        Self {
            welcome: Arc::new(welcome),
            options,
        }
    }

    /// Runs the request/response cycle over `reader` and `writer` until a
    /// response asks to quit (`Ok`) or the connection fails (`Err`).
    ///
    /// Nothing is read before the welcome response has been written.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ProtocolError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut request = Request::new(BufReader::new(reader), self.options);
        let mut writer = BufWriter::new(writer);

        let (mut response, mut handler) = (self.welcome)()?;
        let mut payload = Vec::new();

        loop {
            payload.clear();
            response.write_to(&mut payload);
            writer.write_all(&payload).await?;
            writer.flush().await?;

            match response.next() {
                State::Quit => return Ok(()),
                State::Request => {
                    let line = request.next_line().await?;
                    trace!("Request line: {:?}", line.value());
                    response = handler.on_request(line).await;
                }
                State::Data => {
                    trace!("Entering data state");
                    response = handler.on_data(&mut request).await?;
                }
            }
        }
    }
}

#[async_trait]
impl ServerHandler for TelnetServer {
    async fn on_accepted(&self, mut conn: Connection) {
        let peer = conn.peer_addr();

        let result = {
            let (reader, writer) = conn.split();
            self.serve(reader, writer).await
        };

        match result {
            Ok(()) => debug!("Connection {} quit", peer),
            Err(ProtocolError::ConnectionClosed) => debug!("Connection {} closed by peer", peer),
            Err(e) => warn!("Connection {} aborted: {}", peer, e),
        }

        conn.close().await;
    }
}
