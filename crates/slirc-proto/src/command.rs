//! IRC command identification.
//!
//! The client engine only gives meaning to a fixed set of commands. Everything
//! else is carried through verbatim as [`Command::Unknown`].

use std::fmt;

/// Commands the grammar recognizes by keyword.
///
/// Keywords are matched exactly and case-sensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `001` (RPL_WELCOME).
    Welcome,
    /// `PING`.
    Ping,
    /// `PONG`.
    Pong,
    /// `PRIVMSG`.
    Privmsg,
    /// `NOTICE`.
    Notice,
    /// `ERROR`.
    Error,
    /// `QUIT`.
    Quit,
}

impl CommandKind {
    /// All recognized kinds, in keyword-table order.
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Welcome,
        CommandKind::Ping,
        CommandKind::Pong,
        CommandKind::Privmsg,
        CommandKind::Notice,
        CommandKind::Error,
        CommandKind::Quit,
    ];

    /// Look up a keyword.
    pub fn from_keyword(token: &[u8]) -> Option<Self> {
        match token {
            b"001" => Some(Self::Welcome),
            b"PING" => Some(Self::Ping),
            b"PONG" => Some(Self::Pong),
            b"PRIVMSG" => Some(Self::Privmsg),
            b"NOTICE" => Some(Self::Notice),
            b"ERROR" => Some(Self::Error),
            b"QUIT" => Some(Self::Quit),
            _ => None,
        }
    }

    /// The wire keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "001",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::Privmsg => "PRIVMSG",
            Self::Notice => "NOTICE",
            Self::Error => "ERROR",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The command of a parsed message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// `001`.
    Welcome,
    /// `PING`.
    Ping,
    /// `PONG`.
    Pong,
    /// `PRIVMSG`.
    Privmsg,
    /// `NOTICE`.
    Notice,
    /// `ERROR`.
    Error,
    /// `QUIT`.
    Quit,
    /// Any other command token, kept as received.
    Unknown(String),
}

impl Command {
    /// Map a raw command token to a command.
    pub fn from_token(token: &str) -> Self {
        match CommandKind::from_keyword(token.as_bytes()) {
            Some(kind) => kind.into(),
            None => Command::Unknown(token.to_owned()),
        }
    }

    /// The recognized kind, or `None` for [`Command::Unknown`].
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Command::Welcome => Some(CommandKind::Welcome),
            Command::Ping => Some(CommandKind::Ping),
            Command::Pong => Some(CommandKind::Pong),
            Command::Privmsg => Some(CommandKind::Privmsg),
            Command::Notice => Some(CommandKind::Notice),
            Command::Error => Some(CommandKind::Error),
            Command::Quit => Some(CommandKind::Quit),
            Command::Unknown(_) => None,
        }
    }

    /// The command token as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Command::Unknown(raw) => raw,
            known => known.kind().map_or("", |kind| kind.as_str()),
        }
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Welcome => Command::Welcome,
            CommandKind::Ping => Command::Ping,
            CommandKind::Pong => Command::Pong,
            CommandKind::Privmsg => Command::Privmsg,
            CommandKind::Notice => Command::Notice,
            CommandKind::Error => Command::Error,
            CommandKind::Quit => Command::Quit,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
