//! Line protocol engine
//!
//! Handles line parsing, the handler contract, responses, and the
//! per-connection state machine.

pub mod engine;
pub mod handler;
pub mod line;
pub mod response;
pub mod transport;

pub use engine::{TelnetOptions, TelnetServer};
pub use handler::{BoxHandler, EventHandler, FnHandler, Welcome, WelcomeResult};
pub use line::{Command, Line};
pub use response::{BoxResponse, LineResponse, Response, State};
pub use transport::Request;
