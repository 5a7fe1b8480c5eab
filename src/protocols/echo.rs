//! Echo protocol
//!
//! Repeats every line back to the peer until it says `quit`, `exit` or `bye`.
//! The handler keeps no state, so it is built from a plain function.

use crate::protocol::{BoxResponse, FnHandler, Line, LineResponse, State, WelcomeResult};

/// Welcome callback of the echo protocol
pub fn welcome() -> WelcomeResult {
    Ok((
        LineResponse::boxed("Welcome!!!", State::Request),
        FnHandler::new(echo).boxed(),
    ))
}

fn echo(line: Line) -> BoxResponse {
    let command = line.as_command();

    if command.name.is_empty() {
        return LineResponse::boxed("Please, say something!", State::Request);
    }

    if command.is_any(&["quit", "exit", "bye"]) {
        return LineResponse::boxed("Bye!", State::Quit);
    }

    LineResponse::boxed(format!("You just said: {}", line), State::Request)
}
