//! Event handlers
//!
//! An `EventHandler` services one connection. It is created by the welcome
//! callback when the connection is accepted, and the engine hands it every
//! line (REQUEST state) or the raw line source (DATA state) until one of its
//! responses asks to quit.

use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::protocol::line::Line;
use crate::protocol::response::BoxResponse;
use crate::protocol::transport::Request;

/// Handles the events of a single connection.
#[async_trait]
pub trait EventHandler: Send {
    /// Handles one request line and returns the response to write.
    async fn on_request(&mut self, line: Line) -> BoxResponse;

    /// Consumes a data block from `request`, pulling lines until the handler
    /// decides the block is complete, and returns the response to write.
    async fn on_data(&mut self, request: &mut Request<'_>) -> Result<BoxResponse, ProtocolError>;
}

pub type BoxHandler = Box<dyn EventHandler>;

/// The first response of a connection and the handler that services it.
pub type Welcome = (BoxResponse, BoxHandler);

/// Result of the welcome callback. An error aborts the connection before
/// anything is written to the peer.
pub type WelcomeResult = Result<Welcome, ProtocolError>;

type RequestFn = Box<dyn FnMut(Line) -> BoxResponse + Send>;
type DataFn = Box<dyn FnMut(Line) -> Option<BoxResponse> + Send>;

/// An `EventHandler` built from plain closures, for handlers without state
/// of their own.
///
/// The data closure is fed one line at a time and returns `Some(response)`
/// once the data block is complete.
pub struct FnHandler {
    request: RequestFn,
    data: Option<DataFn>,
}

impl FnHandler {
    pub fn new<F>(request: F) -> Self
    where
        F: FnMut(Line) -> BoxResponse + Send + 'static,
    {
        Self {
            request: Box::new(request),
            data: None,
        }
    }

    pub fn with_data<F>(mut self, data: F) -> Self
    where
        F: FnMut(Line) -> Option<BoxResponse> + Send + 'static,
    {
        self.data = Some(Box::new(data));
        self
    }

    pub fn boxed(self) -> BoxHandler {
        Box::new(self)
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    async fn on_request(&mut self, line: Line) -> BoxResponse {
        (self.request)(line)
    }

    async fn on_data(&mut self, request: &mut Request<'_>) -> Result<BoxResponse, ProtocolError> {
        let data = self.data.as_mut().ok_or(ProtocolError::NoDataHandler)?;

        loop {
            let line = request.next_line().await?;
            if let Some(response) = data(line) {
                return Ok(response);
            }
        }
    }
}
