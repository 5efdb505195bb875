use crate::command::{Command, CommandKind};
use crate::prefix::Prefix;

/// An owned IRC message.
///
/// Middle parameters and the trailing parameter are kept apart so that a
/// message round-trips through the wire format without guessing where the
/// trailing clause began.
///
/// # Example
///
/// ```
/// use slirc_proto::{Command, Message};
///
/// // Parse a message
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.source_nickname(), Some("nick"));
///
/// // Construct a message
/// let reply = Message::privmsg("#channel", "Hello!");
/// assert_eq!(reply.command, Command::Privmsg);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Message origin, if the line carried one.
    pub prefix: Option<Prefix>,
    /// The command.
    pub command: Command,
    /// Middle parameters, in order.
    pub params: Vec<String>,
    /// The trailing parameter, without its leading colon.
    pub trailing: Option<String>,
}

impl Message {
    /// A message with no prefix, no parameters and an empty unknown command.
    ///
    /// This is the starting point the parser fills in.
    pub fn empty() -> Self {
        Self::new(Command::Unknown(String::new()))
    }

    /// Create a message carrying only a command.
    pub fn new(command: impl Into<Command>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params: Vec::new(),
            trailing: None,
        }
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Append a middle parameter.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the trailing parameter.
    #[must_use]
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Create a PRIVMSG message to a target with text
    #[must_use]
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Command::Privmsg).with_param(target).with_trailing(text)
    }

    /// Create a NOTICE message to a target with text
    #[must_use]
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Command::Notice).with_param(target).with_trailing(text)
    }

    /// Create a PING message with a token
    #[must_use]
    pub fn ping(token: impl Into<String>) -> Self {
        Self::new(Command::Ping).with_trailing(token)
    }

    /// Create a PONG message echoing a token
    #[must_use]
    pub fn pong(token: impl Into<String>) -> Self {
        Self::new(Command::Pong).with_trailing(token)
    }

    /// Create a QUIT message without a reason
    #[must_use]
    pub fn quit() -> Self {
        Self::new(Command::Quit)
    }

    /// Create a QUIT message with a reason
    #[must_use]
    pub fn quit_with_message(reason: impl Into<String>) -> Self {
        Self::new(Command::Quit).with_trailing(reason)
    }

    /// The recognized command kind, or `None` for unknown commands.
    pub fn kind(&self) -> Option<CommandKind> {
        self.command.kind()
    }

    /// Get the source of the message prefix, if present.
    pub fn source(&self) -> Option<&str> {
        self.prefix.as_ref()?.source.as_deref()
    }

    /// Get the nickname from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref()?.nick()
    }

    /// The text argument of the message: the trailing parameter, or the last
    /// middle parameter when there is no trailing clause.
    ///
    /// Servers send `PING token` and `PING :token` interchangeably.
    pub fn text(&self) -> Option<&str> {
        self.trailing
            .as_deref()
            .or_else(|| self.params.last().map(String::as_str))
    }

    /// All parameters in order, with the trailing parameter last.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .map(String::as_str)
            .chain(self.trailing.as_deref())
    }
}
