//! Responses
//!
//! A response is what the engine writes back to the peer on each cycle,
//! together with the state the handler wants the engine to enter next.

/// What the engine does after writing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Close the connection
    Quit,
    /// Read one line and hand it to `EventHandler::on_request`
    Request,
    /// Hand the line source to `EventHandler::on_data`
    Data,
}

/// A response to the peer.
pub trait Response: Send {
    /// Renders the payload of this response into `out`.
    fn write_to(&self, out: &mut Vec<u8>);

    /// Returns the state the engine enters once this response is written.
    fn next(&self) -> State;
}

pub type BoxResponse = Box<dyn Response>;

/// A single text line response, written with a CRLF terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResponse {
    value: String,
    next: State,
}

impl LineResponse {
    pub fn new(value: impl Into<String>, next: State) -> Self {
        Self {
            value: value.into(),
            next,
        }
    }

    pub fn boxed(value: impl Into<String>, next: State) -> BoxResponse {
        Box::new(Self::new(value, next))
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Response for LineResponse {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    fn next(&self) -> State {
        self.next
    }
}
