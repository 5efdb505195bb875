//! Unified error handling for slirc-client.
//!
//! Session failures are terminal: they end the session and are surfaced to
//! plugins through `Plugin::on_fault`. Parse failures are line-scoped and only
//! logged.

use slirc_proto::ParseError;
use std::io;
use thiserror::Error;

// ============================================================================
// Session Errors
// ============================================================================

/// Errors that end (or prevent) a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to resolve host: {0}")]
    Resolution(#[source] io::Error),

    #[error("failed to connect: {0}")]
    Connection(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[from] ReadFailure),

    #[error("write failed: {0}")]
    Write(#[from] WriteFailure),

    #[error("malformed line: {0}")]
    Parse(#[from] ParseError),
}

impl SessionError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::Connection(_) => "connection",
            Self::Read(ReadFailure::RemoteClosed) => "remote_closed",
            Self::Read(ReadFailure::LocalClosed) => "local_closed",
            Self::Read(ReadFailure::TransportFault(_)) => "transport_fault",
            Self::Write(_) => "write",
            Self::Parse(e) => e.error_code(),
        }
    }
}

/// Why the read side of a session ended.
#[derive(Debug, Error)]
pub enum ReadFailure {
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    RemoteClosed,

    /// The connection was closed locally by `disconnect()`.
    #[error("connection closed locally")]
    LocalClosed,

    /// The transport failed.
    #[error("transport fault: {0}")]
    TransportFault(#[source] io::Error),
}

impl ReadFailure {
    /// True for orderly closes, which are reported only as a disconnect.
    pub fn is_orderly(&self) -> bool {
        matches!(self, Self::RemoteClosed | Self::LocalClosed)
    }
}

/// Errors returned by the session write API.
#[derive(Debug, Error)]
pub enum WriteFailure {
    /// The session is disconnecting or gone.
    #[error("session is closed")]
    Closed,

    /// `write_sync` was called from a runtime thread, where blocking would
    /// stall the runtime.
    #[error("blocking write called from within the async runtime")]
    BlockingInRuntime,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
