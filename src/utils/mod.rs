//! Utility functions
//!
//! Provides logging setup for the server binary.

pub mod logging;
