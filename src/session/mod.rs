//! Sessions: one connection to one server.
//!
//! A [`Session`] walks a linear state machine,
//!
//! ```text
//! Resolving -> Connecting -> Connected -> Disconnecting -> Disconnected
//! ```
//!
//! published through a watch channel so callers can observe or await it.
//! States only move forward, which makes every transition (and the single
//! disconnect event tied to it) happen exactly once.
//!
//! The session is shared through `Arc`: the lifecycle task, the writer task
//! and every in-flight dispatch hold a clone, so the session is freed only
//! after the last callback returns.

mod error_handling;
mod lifecycle;

use bytes::Bytes;
use parking_lot::Mutex;
use slirc_proto::{LineCodec, Message};
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info};

use crate::dispatch::DispatchOrder;
use crate::error::WriteFailure;
use crate::plugin::{Plugin, PluginRegistry};
use crate::service::ServiceHandle;
use crate::telemetry::spans;
use crate::transport::BoxedStream;

/// Identifies a session within its service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state. Ordered: a session never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Looking up the server's addresses.
    Resolving,
    /// Opening the transport.
    Connecting,
    /// Reading and writing lines.
    Connected,
    /// Closing; queued lines are being flushed.
    Disconnecting,
    /// Terminal. Every event for the session has been delivered.
    Disconnected,
}

/// One connection to an IRC server.
pub struct Session {
    id: SessionId,
    host: String,
    port: u16,
    service: ServiceHandle,
    plugins: PluginRegistry,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    outbound: mpsc::UnboundedSender<Bytes>,
    writer: tokio::sync::Mutex<Option<WriteHalf<BoxedStream>>>,
    write_fault: Mutex<Option<io::Error>>,
    dispatch_order: DispatchOrder,
    max_line_len: usize,
}

impl Session {
    /// Open a session to `host:port` on the given service.
    ///
    /// Returns immediately; resolution and connection happen on the
    /// service's runtime. `plugins` are registered on the session before
    /// anything can be dispatched, so they see the connect event.
    pub fn connect(
        service: &ServiceHandle,
        host: impl Into<String>,
        port: u16,
        plugins: impl IntoIterator<Item = Arc<dyn Plugin>>,
    ) -> Arc<Session> {
        let host = host.into();
        let id = service.next_session_id();
        let (dispatch_order, max_line_len) = service.session_defaults();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(SessionState::Resolving);

        let session = Arc::new(Session {
            id,
            host,
            port,
            service: service.clone(),
            plugins: PluginRegistry::new(),
            state,
            cancel: CancellationToken::new(),
            outbound,
            writer: tokio::sync::Mutex::new(None),
            write_fault: Mutex::new(None),
            dispatch_order,
            max_line_len,
        });
        for plugin in plugins {
            session.plugins.add(plugin);
        }

        service.register(&session);
        let span = spans::session(id, &session.host, port);
        service
            .runtime()
            .spawn(Arc::clone(&session).run(outbound_rx).instrument(span));

        session
    }

    /// Identifier, unique within the service.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Host name the session was opened with.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The service this session belongs to.
    pub fn service(&self) -> &ServiceHandle {
        &self.service
    }

    /// Session-scoped plugins. They run after the service-scoped ones.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// True while the session is in [`SessionState::Connected`].
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Wait until the session has reached (or passed) `target`.
    pub async fn wait_for_state(&self, target: SessionState) -> SessionState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state >= target).await {
            Ok(state) => *state,
            // The sender lives in `self`; it cannot be gone while borrowed.
            Err(_) => SessionState::Disconnected,
        }
    }

    /// Queue one line for sending.
    ///
    /// The bytes are copied, cut at the first CR or LF, and terminated with
    /// CR LF. Lines are written in the order they were queued and never
    /// interleave. Writes queued before the connection is up are sent once
    /// it is. Empty writes are no-ops.
    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<(), WriteFailure> {
        let Some(frame) = LineCodec::frame(data.as_ref()) else {
            return Ok(());
        };
        if self.state() >= SessionState::Disconnecting {
            return Err(WriteFailure::Closed);
        }
        self.outbound
            .send(frame.freeze())
            .map_err(|_| WriteFailure::Closed)
    }

    /// Write one line directly to the transport, blocking the calling thread
    /// until it has been handed over.
    ///
    /// This bypasses the write queue. It must be called from outside the
    /// runtime (it fails with [`WriteFailure::BlockingInRuntime`] on a runtime
    /// thread, which includes plugin callbacks) and only once connected. On a
    /// current-thread service it makes progress only while another thread is
    /// driving the service. A write still blocked when the session closes
    /// fails with [`WriteFailure::Closed`].
    pub fn write_sync(&self, data: impl AsRef<[u8]>) -> Result<(), WriteFailure> {
        let Some(frame) = LineCodec::frame(data.as_ref()) else {
            return Ok(());
        };
        if self.state() >= SessionState::Disconnecting {
            return Err(WriteFailure::Closed);
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(WriteFailure::BlockingInRuntime);
        }

        // A close releases the writer even when the peer stopped reading.
        self.service.runtime().block_on(async {
            let mut guard = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                guard = self.writer.lock() => Some(guard),
            };
            let Some(writer) = guard
                .as_mut()
                .and_then(|guard| Option::as_mut(&mut **guard))
            else {
                return Err(WriteFailure::Closed);
            };

            let written = async {
                writer.write_all(&frame).await?;
                writer.flush().await
            };
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(WriteFailure::Closed),
                result = written => result.map_err(WriteFailure::from),
            }
        })
    }

    /// Queue a message.
    pub fn send(&self, message: &Message) -> Result<(), WriteFailure> {
        self.write(message.to_string())
    }

    /// Queue a PONG answering `token`.
    pub fn pong(&self, token: &str) -> Result<(), WriteFailure> {
        self.send(&Message::pong(token))
    }

    /// Queue a PRIVMSG to `target`.
    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), WriteFailure> {
        self.send(&Message::privmsg(target, text))
    }

    /// Queue a NOTICE to `target`.
    pub fn notice(&self, target: &str, text: &str) -> Result<(), WriteFailure> {
        self.send(&Message::notice(target, text))
    }

    /// Queue a QUIT, with an optional reason.
    pub fn quit(&self, reason: Option<&str>) -> Result<(), WriteFailure> {
        match reason {
            Some(reason) => self.send(&Message::quit_with_message(reason)),
            None => self.send(&Message::quit()),
        }
    }

    /// Close the session.
    ///
    /// Lines already queued are flushed, the transport is shut down, and the
    /// pending read ends as a local close. A peer that stops reading gets a
    /// short grace period, after which unsent lines are dropped. Plugins see exactly one disconnect
    /// event. Before the connection is up this aborts the attempt and no
    /// events fire. Calling it again has no effect.
    pub fn disconnect(&self) {
        if self.advance(SessionState::Disconnecting) {
            info!(session = %self.id, "disconnect requested");
        }
        self.cancel.cancel();
    }

    /// Disconnect and remove the session from its service.
    pub fn destroy(self: Arc<Self>) {
        self.disconnect();
        self.service.deregister(self.id);
    }

    /// Move forward to `target`. Returns false if already there or past it.
    fn advance(&self, target: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if *state < target {
                *state = target;
                true
            } else {
                false
            }
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
