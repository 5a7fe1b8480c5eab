//! Toy SMTP dialogue
//!
//! A mail is built step by step: `HELO`, then `MAIL FROM:`, then one or more
//! `RCPT TO:`, then `DATA`. The data block is read in the DATA state until a
//! line holding a single `.`. Accepted mails are logged and, when an outbox
//! is given, sent to it.

pub mod command;
pub mod response;

use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ProtocolError;
use crate::protocol::{BoxHandler, BoxResponse, EventHandler, Line, Request, WelcomeResult};

use command::{SmtpCommand, Verb, parse_command};
use response::SmtpResponse;

/// A mail accepted at the end of a data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub helo: String,
    pub from: String,
    pub recipients: Vec<String>,
    pub content: String,
}

/// Builds the welcome callback of the SMTP protocol.
pub fn welcome(
    outbox: Option<UnboundedSender<Envelope>>,
) -> impl Fn() -> WelcomeResult + Send + Sync + 'static {
    move || {
        let handler: BoxHandler = Box::new(Mail::new(outbox.clone()));
        Ok((response::ready().boxed(), handler))
    }
}

/// The mail being built on one connection. The filled-in fields tell which
/// step of the dialogue we are in.
pub struct Mail {
    who: Option<String>,
    from: Option<String>,
    recipients: Vec<String>,
    content: String,
    outbox: Option<UnboundedSender<Envelope>>,
}

impl Mail {
    pub fn new(outbox: Option<UnboundedSender<Envelope>>) -> Self {
        Self {
            who: None,
            from: None,
            recipients: Vec::new(),
            content: String::new(),
            outbox,
        }
    }

    /// Drops the current mail; the HELO identity is kept.
    fn reset(&mut self) {
        self.from = None;
        self.recipients.clear();
        self.content.clear();
    }

    fn deliver(&mut self) {
        let envelope = Envelope {
            helo: self.who.clone().unwrap_or_default(),
            from: self.from.clone().unwrap_or_default(),
            recipients: std::mem::take(&mut self.recipients),
            content: std::mem::take(&mut self.content),
        };

        info!(
            "Accepted mail from {} to {:?} ({} bytes)",
            envelope.from,
            envelope.recipients,
            envelope.content.len()
        );

        if let Some(outbox) = &self.outbox {
            if outbox.send(envelope).is_err() {
                warn!("Mail outbox is closed, mail dropped");
            }
        }
    }

    fn helo_step(&mut self, cmd: &SmtpCommand) -> SmtpResponse {
        if cmd.verb != Verb::Helo {
            return response::bad_sequence("polite people say HELO first");
        }

        let [who] = cmd.args() else {
            return response::syntax_error("argument expected");
        };

        self.who = Some(who.clone());
        response::ok(format!("Helo, pleased to meet you {}", who))
    }

    fn mail_step(&mut self, cmd: &SmtpCommand) -> SmtpResponse {
        if cmd.verb != Verb::Mail {
            return response::bad_sequence(format!("need MAIL before {}", cmd.display_name()));
        }

        let from = match address_argument(cmd, "FROM:") {
            Ok(from) => from,
            Err(error) => return error,
        };

        self.from = Some(from.clone());
        response::ok(format!("Sender ok : {}", from))
    }

    fn rcpt_step(&mut self, cmd: &SmtpCommand) -> SmtpResponse {
        match cmd.verb {
            Verb::Data if self.recipients.is_empty() => {
                return response::bad_sequence(format!("need RCPT before {}", cmd.display_name()));
            }
            Verb::Data => return response::start_input(),
            Verb::Mail => return response::bad_sequence("MAIL already started"),
            Verb::Rcpt => {}
            _ => {
                return response::bad_sequence(format!("Illegal command {}", cmd.display_name()));
            }
        }

        let recipient = match address_argument(cmd, "TO:") {
            Ok(recipient) => recipient,
            Err(error) => return error,
        };

        self.recipients.push(recipient.clone());
        response::ok(format!("Recipient ok : {}", recipient))
    }
}

/// Extracts the address of `MAIL FROM: <addr>` / `RCPT TO: <addr>`.
fn address_argument(cmd: &SmtpCommand, keyword: &str) -> Result<String, SmtpResponse> {
    match cmd.args() {
        [key, address] if key.eq_ignore_ascii_case(keyword) => Ok(address.clone()),
        [_, _] => Err(response::syntax_error(format!(
            "{} was expected as first argument",
            keyword
        ))),
        args if args.len() > 2 => Err(response::syntax_error("Too many arguments given")),
        _ => Err(response::syntax_error("Not enough arguments given")),
    }
}

#[async_trait]
impl EventHandler for Mail {
    async fn on_request(&mut self, line: Line) -> BoxResponse {
        let cmd = parse_command(&line);

        let reply = match cmd.verb {
            Verb::Quit => response::quit(),
            Verb::Noop => response::ok("Ok"),
            Verb::Unknown => response::unknown(),
            Verb::Rset => {
                self.reset();
                response::ok("Ok")
            }
            Verb::Helo if self.who.is_some() => {
                response::already_met(self.who.as_deref().unwrap_or_default())
            }
            _ if self.who.is_none() => self.helo_step(&cmd),
            _ if self.from.is_none() => self.mail_step(&cmd),
            _ => self.rcpt_step(&cmd),
        };

        reply.boxed()
    }

    async fn on_data(&mut self, request: &mut Request<'_>) -> Result<BoxResponse, ProtocolError> {
        loop {
            let line = request.next_line().await?;
            let text = line.value();

            if text == "." {
                self.deliver();
                self.reset();
                return Ok(response::ok("Mail accepted").boxed());
            }

            if !self.content.is_empty() {
                self.content.push_str("\r\n");
            }

            // a leading dot is doubled by the client when the line starts with one
            self.content.push_str(text.strip_prefix('.').unwrap_or(text));
        }
    }
}
