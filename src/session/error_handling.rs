//! Error handling utilities for session transport management.

use std::io;

use crate::error::ReadFailure;

/// Classify a transport read error into a read outcome.
///
/// An EOF surfacing as an error (a peer that vanished mid-line) is an orderly
/// remote close; anything else is a transport fault.
pub(super) fn classify_read_error(e: io::Error) -> ReadFailure {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => ReadFailure::RemoteClosed,
        _ => ReadFailure::TransportFault(e),
    }
}
