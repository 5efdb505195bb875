use slirc_proto::Message;
use tracing::debug;

use super::Plugin;
use crate::session::Session;

/// Answers every `PING` with a `PONG` carrying the same token.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAlive;

impl Plugin for KeepAlive {
    fn on_ping(&self, session: &Session, message: &Message) {
        let token = message.text().unwrap_or_default();
        if let Err(e) = session.pong(token) {
            debug!(error = %e, "could not answer PING");
        }
    }
}
