//! Telemetry utilities for session tracing.

/// Standardized span constructors for client observability.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    use crate::plugin::EventKind;
    use crate::session::SessionId;

    /// Create a span for one session's lifetime.
    pub fn session(id: SessionId, host: &str, port: u16) -> Span {
        info_span!("session", id = %id, host = %host, port = port)
    }

    /// Create a span for delivering one event to the plugin registries.
    pub fn dispatch(kind: EventKind) -> Span {
        debug_span!("dispatch", kind = %kind)
    }
}
