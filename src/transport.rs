//! Transport collaborator: name resolution and stream establishment.
//!
//! Sessions never touch sockets directly. They ask a [`Connector`] to resolve
//! the host and open a byte stream, which keeps the session state machine
//! independent of TCP (tests plug in in-memory duplex pipes).

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Any bidirectional byte stream a session can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

/// Type-erased connection stream.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Resolves hosts and opens streams for sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Resolve `host` to candidate socket addresses.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;

    /// Connect to the first reachable address.
    async fn connect(&self, addrs: &[SocketAddr]) -> io::Result<BoxedStream>;
}

/// Plain TCP connector using hickory for DNS.
pub struct TcpConnector {
    resolver: TokioResolver,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpConnector {
    /// Create a connector using the system resolver configuration.
    pub fn new() -> Self {
        // Try system config, fall back to defaults
        let resolver = TokioResolver::builder_tokio()
            .map(|b| b.build())
            .unwrap_or_else(|_| {
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
                .build()
            });

        Self { resolver }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![SocketAddr::new(ip, port)]);
        }

        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => {
                let addrs: Vec<SocketAddr> =
                    lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect();
                debug!(host = %host, count = addrs.len(), "resolved host");
                if addrs.is_empty() {
                    Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no addresses for {host}"),
                    ))
                } else {
                    Ok(addrs)
                }
            }
            Err(e) => {
                // hosts-file names and other local aliases
                warn!(host = %host, error = %e, "DNS lookup failed, trying system resolver");
                let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port)).await?.collect();
                if addrs.is_empty() {
                    Err(io::Error::new(io::ErrorKind::NotFound, e))
                } else {
                    Ok(addrs)
                }
            }
        }
    }

    async fn connect(&self, addrs: &[SocketAddr]) -> io::Result<BoxedStream> {
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(addr = %addr, "connected");
                    return Ok(Box::new(stream));
                }
                Err(e) => {
                    debug!(addr = %addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses to connect to")
        }))
    }
}
