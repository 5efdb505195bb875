//! Plugins: observers of session events.
//!
//! A plugin implements [`Plugin`] and overrides the callbacks it cares about;
//! every callback has a no-op default. Plugins live in a [`PluginRegistry`],
//! either service-wide (seeing every session) or on one session.
//!
//! Callbacks run synchronously on a runtime worker. They must not block; to
//! send, use the session's queued writers (`Session::send`, `Session::pong`,
//! ...), never `Session::write_sync`.

mod keepalive;
mod registry;

pub use keepalive::KeepAlive;
pub use registry::{PluginHandle, PluginRegistry};

use slirc_proto::{Command, Message};
use std::fmt;

use crate::error::SessionError;
use crate::session::Session;

/// Event callbacks. All methods default to doing nothing.
#[allow(unused_variables)]
pub trait Plugin: Send + Sync {
    /// The transport is up; the session is `Connected`.
    fn on_connect(&self, session: &Session) {}

    /// `001` (registration accepted).
    fn on_welcome(&self, session: &Session, message: &Message) {}

    /// `PING`.
    fn on_ping(&self, session: &Session, message: &Message) {}

    /// `PONG`.
    fn on_pong(&self, session: &Session, message: &Message) {}

    /// `PRIVMSG`.
    fn on_privmsg(&self, session: &Session, message: &Message) {}

    /// `NOTICE`.
    fn on_notice(&self, session: &Session, message: &Message) {}

    /// `ERROR`.
    fn on_error(&self, session: &Session, message: &Message) {}

    /// `QUIT`.
    fn on_quit(&self, session: &Session, message: &Message) {}

    /// Any command without a dedicated callback; `command` is the raw token.
    fn on_unknown(&self, session: &Session, command: &str, message: &Message) {}

    /// The session ended. Fired exactly once per connected session.
    fn on_disconnect(&self, session: &Session) {}

    /// The session failed: resolution, connection or transport error.
    fn on_fault(&self, session: &Session, error: &SessionError) {}
}

/// The kinds of event a plugin can observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The transport came up.
    Connect,
    /// `001` received.
    Welcome,
    /// `PING` received.
    Ping,
    /// `PONG` received.
    Pong,
    /// `PRIVMSG` received.
    Privmsg,
    /// `NOTICE` received.
    Notice,
    /// `ERROR` received.
    Error,
    /// `QUIT` received.
    Quit,
    /// A command with no dedicated event.
    Unknown,
    /// The session ended.
    Disconnect,
    /// The session failed.
    Fault,
}

impl EventKind {
    /// The event a received command maps to.
    pub fn of(command: &Command) -> Self {
        match command {
            Command::Welcome => Self::Welcome,
            Command::Ping => Self::Ping,
            Command::Pong => Self::Pong,
            Command::Privmsg => Self::Privmsg,
            Command::Notice => Self::Notice,
            Command::Error => Self::Error,
            Command::Quit => Self::Quit,
            Command::Unknown(_) => Self::Unknown,
        }
    }

    /// Lowercase name, as used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Welcome => "welcome",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Privmsg => "privmsg",
            Self::Notice => "notice",
            Self::Error => "error",
            Self::Quit => "quit",
            Self::Unknown => "unknown",
            Self::Disconnect => "disconnect",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
