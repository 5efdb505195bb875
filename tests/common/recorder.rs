//! A plugin that writes down everything it is told.

use slirc_client::{EventKind, Message, Plugin, Session, SessionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One observed event.
#[derive(Clone, Debug, PartialEq)]
pub enum Seen {
    Connect,
    Message(EventKind, Message),
    Unknown(String),
    Disconnect,
    /// The fault's error code.
    Fault(&'static str),
}

impl Seen {
    pub fn is_message(&self, kind: EventKind) -> bool {
        matches!(self, Seen::Message(k, _) if *k == kind)
    }
}

/// Shared, ordered log of `(recorder label, event)` pairs.
pub struct EventLog {
    entries: watch::Sender<Vec<(String, Seen)>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: watch::Sender::new(Vec::new()),
        })
    }

    /// A plugin appending to this log under `label`.
    pub fn recorder(self: &Arc<Self>, label: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            label: label.to_string(),
            log: Arc::clone(self),
        })
    }

    pub fn entries(&self) -> Vec<(String, Seen)> {
        self.entries.borrow().clone()
    }

    /// Events recorded under `label`, in order.
    pub fn seen_by(&self, label: &str) -> Vec<Seen> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, seen)| seen.clone())
            .collect()
    }

    /// Wait until the log satisfies `predicate`. Panics after five seconds.
    pub async fn wait_until<F>(&self, mut predicate: F)
    where
        F: FnMut(&[(String, Seen)]) -> bool,
    {
        let mut rx = self.entries.subscribe();
        let waited = timeout(WAIT_TIMEOUT, rx.wait_for(|entries| predicate(entries))).await;
        match waited {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => panic!("event log closed"),
            Err(_) => panic!("timed out waiting for events; saw {:?}", self.entries()),
        }
    }

    /// Wait until `label` has recorded `count` events matching `filter`.
    pub async fn wait_for_count<F>(&self, label: &str, count: usize, filter: F)
    where
        F: Fn(&Seen) -> bool,
    {
        self.wait_until(|entries| {
            entries
                .iter()
                .filter(|(l, seen)| l == label && filter(seen))
                .count()
                >= count
        })
        .await;
    }

    fn push(&self, label: &str, seen: Seen) {
        self.entries.send_modify(|entries| entries.push((label.to_string(), seen)));
    }
}

/// Records every callback into its [`EventLog`].
pub struct Recorder {
    label: String,
    log: Arc<EventLog>,
}

impl Recorder {
    fn message(&self, kind: EventKind, message: &Message) {
        self.log.push(&self.label, Seen::Message(kind, message.clone()));
    }
}

impl Plugin for Recorder {
    fn on_connect(&self, _session: &Session) {
        self.log.push(&self.label, Seen::Connect);
    }

    fn on_welcome(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Welcome, message);
    }

    fn on_ping(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Ping, message);
    }

    fn on_pong(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Pong, message);
    }

    fn on_privmsg(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Privmsg, message);
    }

    fn on_notice(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Notice, message);
    }

    fn on_error(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Error, message);
    }

    fn on_quit(&self, _session: &Session, message: &Message) {
        self.message(EventKind::Quit, message);
    }

    fn on_unknown(&self, _session: &Session, command: &str, _message: &Message) {
        self.log.push(&self.label, Seen::Unknown(command.to_string()));
    }

    fn on_disconnect(&self, _session: &Session) {
        self.log.push(&self.label, Seen::Disconnect);
    }

    fn on_fault(&self, _session: &Session, error: &SessionError) {
        self.log.push(&self.label, Seen::Fault(error.error_code()));
    }
}
