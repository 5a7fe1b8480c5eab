//! SMTP command parsing

use crate::protocol::{Command, Line};

/// The SMTP verbs understood by the toy dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Quit,
    Noop,
    Helo,
    Mail,
    Rcpt,
    Data,
    Rset,
    Unknown,
}

/// A command line together with its SMTP verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpCommand {
    pub verb: Verb,
    pub command: Command,
}

impl SmtpCommand {
    /// Upper-cased command name, for messages
    pub fn display_name(&self) -> String {
        self.command.name.to_uppercase()
    }

    pub fn args(&self) -> &[String] {
        &self.command.args
    }
}

pub fn parse_command(line: &Line) -> SmtpCommand {
    let command = line.as_command();

    let verb = match command.name.as_str() {
        "noop" => Verb::Noop,
        "helo" => Verb::Helo,
        "mail" => Verb::Mail,
        "rcpt" => Verb::Rcpt,
        "data" => Verb::Data,
        "rset" => Verb::Rset,
        "quit" | "bye" | "exit" => Verb::Quit,
        _ => Verb::Unknown,
    };

    SmtpCommand { verb, command }
}
