//! Error handling
//!
//! Defines error types for the acceptor and the protocol engine.

pub mod types;

pub use types::*;
