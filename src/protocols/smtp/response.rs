//! SMTP responses
//!
//! Every response is a single `<code> <text>` line.

use crate::protocol::{BoxResponse, LineResponse, Response, State};

/// Standard SMTP reply codes
pub const READY: u16 = 220;
pub const CLOSING: u16 = 221;
pub const OK: u16 = 250;
pub const START_INPUT: u16 = 354;
pub const UNRECOGNIZED: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const BAD_SEQUENCE: u16 = 503;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    code: u16,
    line: LineResponse,
}

impl SmtpResponse {
    pub fn new(code: u16, text: impl Into<String>, next: State) -> Self {
        Self {
            code,
            line: LineResponse::new(text, next),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn boxed(self) -> BoxResponse {
        Box::new(self)
    }
}

impl Response for SmtpResponse {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("{} ", self.code).as_bytes());
        self.line.write_to(out);
    }

    fn next(&self) -> State {
        self.line.next()
    }
}

pub fn ready() -> SmtpResponse {
    SmtpResponse::new(READY, "Welcome, SMTP Ready", State::Request)
}

pub fn ok(text: impl Into<String>) -> SmtpResponse {
    SmtpResponse::new(OK, text, State::Request)
}

pub fn quit() -> SmtpResponse {
    SmtpResponse::new(CLOSING, "Sayonara!", State::Quit)
}

pub fn start_input() -> SmtpResponse {
    SmtpResponse::new(
        START_INPUT,
        "enter mail, end with \".\" on a line by itself",
        State::Data,
    )
}

pub fn unknown() -> SmtpResponse {
    SmtpResponse::new(UNRECOGNIZED, "Command unrecognized", State::Request)
}

pub fn syntax_error(text: impl Into<String>) -> SmtpResponse {
    SmtpResponse::new(SYNTAX_ERROR, text, State::Request)
}

pub fn bad_sequence(text: impl Into<String>) -> SmtpResponse {
    SmtpResponse::new(BAD_SEQUENCE, text, State::Request)
}

pub fn already_met(who: &str) -> SmtpResponse {
    bad_sequence(format!("We already met together, {}", who))
}
