//! Line and command parsing
//!
//! A `Line` is one text line received from the peer with its terminator
//! stripped. A `Command` is the parsed view of it: a lower-cased name and the
//! remaining whitespace-delimited arguments.

use std::fmt;

/// One text line received from the peer, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    value: String,
}

impl Line {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the raw text of this line.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parses this line as a command line.
    ///
    /// The first whitespace-delimited token becomes the lower-cased command
    /// name; the following tokens are kept verbatim as arguments. An empty or
    /// blank line yields an empty name and no arguments.
    pub fn as_command(&self) -> Command {
        let mut tokens = self.value.split_whitespace();
        let name = tokens.next().unwrap_or("").to_lowercase();
        let args = tokens.map(str::to_string).collect();

        Command { name, args }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A command line split into its name and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    /// Command name, always lower case
    pub name: String,
    /// Arguments in order, case preserved
    pub args: Vec<String>,
}

impl Command {
    /// Returns true if the command name is one of `names`.
    pub fn is_any(&self, names: &[&str]) -> bool {
        names.contains(&self.name.as_str())
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
