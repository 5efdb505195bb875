#![allow(dead_code)]

//! Integration test common infrastructure.
//!
//! Provides an in-memory connector standing in for the network, a handle on
//! the server end of each connection, and a plugin that records every event
//! it sees.

pub mod connector;
pub mod recorder;

use slirc_client::{Service, ServiceBuilder};

#[allow(unused_imports)]
pub use connector::{Behavior, MemoryConnector, Peer, PeerListener};
#[allow(unused_imports)]
pub use recorder::{EventLog, Recorder, Seen};

/// Build a service over an in-memory connector.
///
/// `configure` tweaks the builder (threads, dispatch order, line limit).
pub fn harness(
    behavior: Behavior,
    configure: impl FnOnce(ServiceBuilder) -> ServiceBuilder,
) -> (Service, PeerListener) {
    let (connector, listener) = MemoryConnector::new(behavior);
    let service = configure(Service::builder().connector(connector))
        .build()
        .expect("Failed to build service");
    (service, listener)
}
