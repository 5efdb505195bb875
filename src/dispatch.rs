//! Event delivery to plugin registries.
//!
//! Every event goes to the service-scoped plugins first, then to the
//! session-scoped plugins, each registry in insertion order. Delivery is
//! synchronous. A callback that panics is logged and skipped; it does not
//! take the session down.

use serde::Deserialize;
use slirc_proto::{Command, Message};
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};

use crate::error::SessionError;
use crate::plugin::{EventKind, Plugin};
use crate::session::Session;
use crate::telemetry::spans;

/// How the lines of one session are handed to plugins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOrder {
    /// One dispatch task per session consumes lines in arrival order. The
    /// disconnect event fires after every received line was dispatched.
    #[default]
    Ordered,
    /// One task per line. Lines may be dispatched out of order.
    Concurrent,
}

enum Event<'a> {
    Connect,
    Message(&'a Message),
    Disconnect,
    Fault(&'a SessionError),
}

impl Event<'_> {
    fn kind(&self) -> EventKind {
        match self {
            Event::Connect => EventKind::Connect,
            Event::Message(message) => EventKind::of(&message.command),
            Event::Disconnect => EventKind::Disconnect,
            Event::Fault(_) => EventKind::Fault,
        }
    }
}

/// Deliver a received message.
pub fn dispatch(session: &Session, message: &Message) {
    deliver(session, Event::Message(message));
}

pub(crate) fn connect(session: &Session) {
    deliver(session, Event::Connect);
}

pub(crate) fn disconnect(session: &Session) {
    deliver(session, Event::Disconnect);
}

pub(crate) fn fault(session: &Session, error: &SessionError) {
    deliver(session, Event::Fault(error));
}

fn deliver(session: &Session, event: Event<'_>) {
    let kind = event.kind();
    let _span = spans::dispatch(kind).entered();

    let service_plugins = session.service().plugins().snapshot();
    let session_plugins = session.plugins().snapshot();
    trace!(
        service = service_plugins.len(),
        session = session_plugins.len(),
        "delivering"
    );

    for plugin in service_plugins.iter().chain(session_plugins.iter()) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            invoke(plugin.as_ref(), session, &event);
        }));
        if outcome.is_err() {
            error!(event = %kind, "plugin callback panicked");
        }
    }
}

fn invoke(plugin: &dyn Plugin, session: &Session, event: &Event<'_>) {
    match *event {
        Event::Connect => plugin.on_connect(session),
        Event::Disconnect => plugin.on_disconnect(session),
        Event::Fault(error) => plugin.on_fault(session, error),
        Event::Message(message) => match &message.command {
            Command::Welcome => plugin.on_welcome(session, message),
            Command::Ping => plugin.on_ping(session, message),
            Command::Pong => plugin.on_pong(session, message),
            Command::Privmsg => plugin.on_privmsg(session, message),
            Command::Notice => plugin.on_notice(session, message),
            Command::Error => plugin.on_error(session, message),
            Command::Quit => plugin.on_quit(session, message),
            Command::Unknown(raw) => plugin.on_unknown(session, raw, message),
        },
    }
}
