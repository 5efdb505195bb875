//! Table-driven parser for one IRC line.
//!
//! The parser consumes [`Token`]s from the [`Scanner`] and walks a fixed
//! transition table keyed by `(State, TokenKind)`. Each transition names the
//! next state and an action that fills in the [`Message`] being built.
//!
//! ```text
//! message  = [ ":" prefix SPACE ] command *( SPACE param ) [ SPACE ":" trailing ] CRLF
//! prefix   = source [ "!" user ] [ "@" host ]
//! ```
//!
//! At most [`MAX_PARAMS`] middle parameters are accepted; the trailing
//! parameter does not count against the limit.

use crate::command::Command;
use crate::error::{ParseError, Result};
use crate::message::Message;
use crate::prefix::Prefix;
use crate::scanner::{Scanner, Token, TokenKind};

/// Maximum number of middle parameters in one line.
pub const MAX_PARAMS: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    /// After the prefix colon.
    PrefixMarker,
    PrefixSource,
    PrefixUserMarker,
    PrefixUser,
    PrefixHostMarker,
    PrefixHost,
    AwaitCommand,
    AfterCommand,
    AwaitParam,
    AfterParam,
    /// After a trailing colon.
    TrailingMarker,
    AfterTrailing,
    Accepted,
}

impl State {
    fn has_command(self) -> bool {
        matches!(
            self,
            State::AfterCommand
                | State::AwaitParam
                | State::AfterParam
                | State::TrailingMarker
                | State::AfterTrailing
                | State::Accepted
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Skip,
    Source,
    User,
    Host,
    Command,
    Param,
    Trailing,
}

enum Reject {
    MissingCommand,
    Unexpected,
}

/// The transition table.
fn transition(state: State, kind: TokenKind) -> std::result::Result<(State, Action), Reject> {
    use TokenKind as T;

    let step = match (state, kind) {
        (State::Start, T::Colon) => (State::PrefixMarker, Action::Skip),
        (State::Start | State::AwaitCommand, T::Command(_) | T::Param) => {
            (State::AfterCommand, Action::Command)
        }
        (State::Start | State::AwaitCommand, T::Crlf | T::Colon)
        | (State::PrefixSource | State::PrefixUser | State::PrefixHost, T::Crlf) => {
            return Err(Reject::MissingCommand)
        }

        (State::PrefixMarker, T::Nickname | T::ServerName) => (State::PrefixSource, Action::Source),
        (State::PrefixSource, T::Exclamation) => (State::PrefixUserMarker, Action::Skip),
        (State::PrefixSource | State::PrefixUser, T::At) => (State::PrefixHostMarker, Action::Skip),
        (State::PrefixUserMarker, T::User) => (State::PrefixUser, Action::User),
        (State::PrefixHostMarker, T::Host) => (State::PrefixHost, Action::Host),
        (State::PrefixSource | State::PrefixUser | State::PrefixHost, T::Space) => {
            (State::AwaitCommand, Action::Skip)
        }

        (State::AfterCommand | State::AfterParam, T::Space) => (State::AwaitParam, Action::Skip),
        // A keyword in parameter position is just a parameter.
        (State::AwaitParam, T::Param | T::Command(_)) => (State::AfterParam, Action::Param),
        (State::AwaitParam, T::Colon) => (State::TrailingMarker, Action::Skip),
        (State::TrailingMarker, T::Trailing) => (State::AfterTrailing, Action::Trailing),

        (
            State::AfterCommand | State::AwaitParam | State::AfterParam | State::AfterTrailing,
            T::Crlf,
        ) => (State::Accepted, Action::Skip),

        _ => return Err(Reject::Unexpected),
    };
    Ok(step)
}

fn utf8(token: &Token<'_>) -> Result<String> {
    std::str::from_utf8(token.lexeme)
        .map(str::to_owned)
        .map_err(|e| ParseError::InvalidUtf8 {
            position: token.position + e.valid_up_to(),
        })
}

/// Incremental parser state for one line.
#[derive(Debug)]
pub struct Parser {
    state: State,
    message: Message,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser positioned before the first token.
    pub fn new() -> Self {
        Self {
            state: State::Start,
            message: Message::empty(),
        }
    }

    /// Consume one token.
    pub fn feed(&mut self, token: Token<'_>) -> Result<()> {
        let (next, action) = transition(self.state, token.kind).map_err(|reject| match reject {
            Reject::MissingCommand => ParseError::MissingCommand,
            Reject::Unexpected => ParseError::UnexpectedToken {
                kind: token.kind,
                position: token.position,
            },
        })?;

        match action {
            Action::Skip => {}
            Action::Source => {
                self.message.prefix = Some(Prefix::source(utf8(&token)?));
            }
            Action::User => {
                let user = utf8(&token)?;
                self.message.prefix.get_or_insert_with(Prefix::default).user = Some(user);
            }
            Action::Host => {
                let host = utf8(&token)?;
                self.message.prefix.get_or_insert_with(Prefix::default).host = Some(host);
            }
            Action::Command => {
                self.message.command = match token.kind {
                    TokenKind::Command(kind) => Command::from(kind),
                    _ => Command::Unknown(utf8(&token)?),
                };
            }
            Action::Param => {
                if self.message.params.len() == MAX_PARAMS {
                    return Err(ParseError::TooManyParams { limit: MAX_PARAMS });
                }
                self.message.params.push(utf8(&token)?);
            }
            Action::Trailing => {
                self.message.trailing = Some(utf8(&token)?);
            }
        }

        self.state = next;
        Ok(())
    }

    /// Finish the line, yielding the message if the terminator was seen.
    pub fn finish(self) -> Result<Message> {
        match self.state {
            State::Accepted => Ok(self.message),
            state if state.has_command() => Err(ParseError::MissingTerminator),
            _ => Err(ParseError::MissingCommand),
        }
    }
}

/// Parse one complete line, including its CR LF terminator.
///
/// ```
/// use slirc_proto::{parse, Command};
///
/// let msg = parse(b":irc.example.com PING :token\r\n").unwrap();
/// assert_eq!(msg.command, Command::Ping);
/// assert_eq!(msg.trailing.as_deref(), Some("token"));
/// ```
pub fn parse(line: &[u8]) -> Result<Message> {
    let mut parser = Parser::new();
    for token in Scanner::new(line) {
        parser.feed(token?)?;
    }
    parser.finish()
}
