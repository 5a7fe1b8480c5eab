pub mod config;
pub mod error;
pub mod protocol;
pub mod protocols;
pub mod server;
pub mod utils;

pub use error::{ProtocolError, ServerError};
pub use protocol::{
    BoxHandler, BoxResponse, Command, EventHandler, FnHandler, Line, LineResponse, Request,
    Response, State, TelnetOptions, TelnetServer, Welcome, WelcomeResult,
};
pub use server::{Connection, Server, ServerHandler, ServerOptions};
