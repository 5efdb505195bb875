//! The service: runtime, service-wide plugins and live sessions.
//!
//! A [`Service`] owns the tokio runtime every session runs on. Sessions and
//! plugins hold a [`ServiceHandle`], the cheap cloneable view of the shared
//! state; the runtime itself stays with the `Service` value.

use dashmap::DashMap;
use slirc_proto::MAX_LINE_LEN;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::{self, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::dispatch::DispatchOrder;
use crate::plugin::{Plugin, PluginRegistry};
use crate::session::{Session, SessionId};
use crate::transport::{Connector, TcpConnector};

struct ServiceShared {
    runtime: runtime::Handle,
    plugins: PluginRegistry,
    sessions: DashMap<SessionId, Weak<Session>>,
    stopped: CancellationToken,
    next_id: AtomicU64,
    connector: Arc<dyn Connector>,
    dispatch_order: DispatchOrder,
    max_line_len: usize,
}

/// Shared handle to a service.
#[derive(Clone)]
pub struct ServiceHandle {
    shared: Arc<ServiceShared>,
}

impl ServiceHandle {
    /// Service-scoped plugins; they see every session's events, before the
    /// session's own plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.shared.plugins
    }

    /// Open a session. See [`Session::connect`].
    pub fn connect(
        &self,
        host: impl Into<String>,
        port: u16,
        plugins: impl IntoIterator<Item = Arc<dyn Plugin>>,
    ) -> Arc<Session> {
        Session::connect(self, host, port, plugins)
    }

    /// Disconnect every live session and wake `Service::run`.
    pub fn stop(&self) {
        let live: Vec<Arc<Session>> = self
            .shared
            .sessions
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect();
        info!(sessions = live.len(), "stopping service");
        for session in live {
            session.disconnect();
        }
        self.shared.stopped.cancel();
    }

    /// True once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.is_cancelled()
    }

    /// Number of sessions not yet torn down.
    pub fn session_count(&self) -> usize {
        self.shared.sessions.len()
    }

    /// Look up a live session.
    pub fn session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.shared.sessions.get(&id)?.upgrade()
    }

    pub(crate) fn runtime(&self) -> &runtime::Handle {
        &self.shared.runtime
    }

    pub(crate) fn connector(&self) -> Arc<dyn Connector> {
        Arc::clone(&self.shared.connector)
    }

    pub(crate) fn next_session_id(&self) -> SessionId {
        SessionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn session_defaults(&self) -> (DispatchOrder, usize) {
        (self.shared.dispatch_order, self.shared.max_line_len)
    }

    pub(crate) fn register(&self, session: &Arc<Session>) {
        self.shared
            .sessions
            .insert(session.id(), Arc::downgrade(session));
    }

    pub(crate) fn deregister(&self, id: SessionId) {
        if self.shared.sessions.remove(&id).is_some() {
            debug!(session = %id, "session deregistered");
        }
    }
}

/// Owns the runtime. Dropping it shuts the runtime down.
pub struct Service {
    runtime: Runtime,
    handle: ServiceHandle,
}

impl Service {
    /// A current-thread service with the TCP connector and default session
    /// settings.
    pub fn new() -> io::Result<Self> {
        Self::builder().build()
    }

    /// Start configuring a service.
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::default()
    }

    /// Build from the `[service]` and `[session]` configuration sections.
    pub fn from_config(config: &Config) -> io::Result<Self> {
        Self::builder()
            .worker_threads(config.service.worker_threads)
            .dispatch_order(config.session.dispatch_order)
            .max_line_len(config.session.max_line_len)
            .build()
    }

    /// A cloneable handle for sessions, plugins and other threads.
    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Service-scoped plugins. See [`ServiceHandle::plugins`].
    pub fn plugins(&self) -> &PluginRegistry {
        self.handle.plugins()
    }

    /// Open a session. See [`Session::connect`].
    pub fn connect(
        &self,
        host: impl Into<String>,
        port: u16,
        plugins: impl IntoIterator<Item = Arc<dyn Plugin>>,
    ) -> Arc<Session> {
        Session::connect(&self.handle, host, port, plugins)
    }

    /// Drive the service until [`stop`](Self::stop) is called.
    ///
    /// Blocks the calling thread, which must not be a runtime thread.
    pub fn run(&self) {
        self.runtime.block_on(self.handle.shared.stopped.cancelled());
        debug!("service run loop finished");
    }

    /// Run whatever work is ready, then return.
    ///
    /// For current-thread services embedded in a foreign event loop.
    pub fn poll(&self) {
        self.runtime.block_on(tokio::task::yield_now());
    }

    /// Run a future to completion on the service's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Disconnect every live session and make [`run`](Self::run) return.
    pub fn stop(&self) {
        self.handle.stop();
    }
}

/// Builder for [`Service`].
pub struct ServiceBuilder {
    worker_threads: usize,
    connector: Option<Arc<dyn Connector>>,
    dispatch_order: DispatchOrder,
    max_line_len: usize,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            connector: None,
            dispatch_order: DispatchOrder::default(),
            max_line_len: MAX_LINE_LEN,
        }
    }
}

impl ServiceBuilder {
    /// Worker threads; 0 (the default) builds a current-thread runtime.
    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Replace the TCP connector.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// How received lines of one session are dispatched.
    pub fn dispatch_order(mut self, order: DispatchOrder) -> Self {
        self.dispatch_order = order;
        self
    }

    /// Longest accepted line, CR LF included.
    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Build the runtime and the service.
    pub fn build(self) -> io::Result<Service> {
        let runtime = if self.worker_threads == 0 {
            runtime::Builder::new_current_thread().enable_all().build()?
        } else {
            runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .thread_name("slirc-worker")
                .enable_all()
                .build()?
        };

        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let _guard = runtime.enter();
                Arc::new(TcpConnector::new())
            }
        };

        debug!(
            worker_threads = self.worker_threads,
            dispatch_order = ?self.dispatch_order,
            max_line_len = self.max_line_len,
            "service built"
        );

        let handle = ServiceHandle {
            shared: Arc::new(ServiceShared {
                runtime: runtime.handle().clone(),
                plugins: PluginRegistry::new(),
                sessions: DashMap::new(),
                stopped: CancellationToken::new(),
                next_id: AtomicU64::new(1),
                connector,
                dispatch_order: self.dispatch_order,
                max_line_len: self.max_line_len,
            }),
        };

        Ok(Service { runtime, handle })
    }
}
