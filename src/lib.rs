//! slirc-client - Straylight IRC client engine.
//!
//! An asynchronous IRC client core: a [`Service`] hosts any number of
//! [`Session`]s, each reading CR LF lines from its server, parsing them with
//! `slirc-proto`, and dispatching the resulting events to [`Plugin`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//! use slirc_client::{KeepAlive, Plugin, Service};
//!
//! let service = Service::new()?;
//! service.plugins().add(Arc::new(KeepAlive));
//! let session = service.connect("irc.libera.chat", 6667, Vec::<Arc<dyn Plugin>>::new());
//! session.write("NICK slirc")?;
//! session.write("USER slirc 0 * :slirc client")?;
//! service.run();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod plugin;
pub mod service;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use config::Config;
pub use dispatch::DispatchOrder;
pub use error::{ReadFailure, SessionError, WriteFailure};
pub use plugin::{EventKind, KeepAlive, Plugin, PluginHandle, PluginRegistry};
pub use service::{Service, ServiceBuilder, ServiceHandle};
pub use session::{Session, SessionId, SessionState};
pub use transport::{AsyncStream, BoxedStream, Connector, TcpConnector};

pub use slirc_proto as proto;
pub use slirc_proto::{Command, Message, Prefix};
