//! Commands accepted on the interactive console.

use std::fmt;

/// One line of console input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Exit,
    Unknown(String),
}

impl Command {
    pub const ACCEPTED: &'static str = "start | stop | exit";

    /// Parse one input line. Case and surrounding whitespace are ignored.
    pub fn parse(line: &str) -> Self {
        let word = line.trim();
        match word.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "exit" => Self::Exit,
            _ => Self::Unknown(word.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
            Self::Exit => f.write_str("exit"),
            Self::Unknown(word) => write!(f, "{word:?}"),
        }
    }
}
