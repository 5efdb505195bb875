//! In-memory transport for sessions under test.

use async_trait::async_trait;
use slirc_client::{BoxedStream, Connector};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// How the connector treats each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Resolve and connect normally.
    Accept,
    /// Resolution fails.
    FailResolve,
    /// Resolution succeeds, the connection is refused.
    FailConnect,
    /// Resolution never completes.
    Hang,
    /// Connect normally, but the client sees a reset instead of EOF.
    ResetOnClose,
}

/// A [`Connector`] that hands out in-memory duplex pipes.
pub struct MemoryConnector {
    behavior: Behavior,
    peers: mpsc::UnboundedSender<Peer>,
}

impl MemoryConnector {
    /// Create a connector and the listener receiving the server ends.
    pub fn new(behavior: Behavior) -> (Arc<Self>, PeerListener) {
        let (peers, incoming) = mpsc::unbounded_channel();
        (Arc::new(Self { behavior, peers }), PeerListener { incoming })
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        match self.behavior {
            Behavior::FailResolve => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unknown host {host}"),
            )),
            Behavior::Hang => std::future::pending().await,
            _ => Ok(vec![SocketAddr::from(([127, 0, 0, 1], port))]),
        }
    }

    async fn connect(&self, _addrs: &[SocketAddr]) -> io::Result<BoxedStream> {
        if self.behavior == Behavior::FailConnect {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        self.peers
            .send(Peer::new(server))
            .map_err(|_| io::Error::other("listener dropped"))?;

        if self.behavior == Behavior::ResetOnClose {
            Ok(Box::new(ResetOnEof(client)))
        } else {
            Ok(Box::new(client))
        }
    }
}

/// Receives the server end of every connection the connector opens.
pub struct PeerListener {
    incoming: mpsc::UnboundedReceiver<Peer>,
}

impl PeerListener {
    /// Wait for the next connection.
    pub async fn accept(&mut self) -> anyhow::Result<Peer> {
        timeout(IO_TIMEOUT, self.incoming.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("connector dropped"))
    }
}

/// The server side of one connection.
pub struct Peer {
    stream: BufReader<DuplexStream>,
}

impl Peer {
    fn new(stream: DuplexStream) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    /// Send one line, adding CR LF.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.send_raw(format!("{line}\r\n").as_bytes()).await
    }

    /// Send bytes as-is.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Receive one line, without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let read = timeout(IO_TIMEOUT, self.stream.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Wait for the client to close its side.
    pub async fn expect_eof(&mut self) -> anyhow::Result<()> {
        let mut line = String::new();
        let read = timeout(IO_TIMEOUT, self.stream.read_line(&mut line)).await??;
        anyhow::ensure!(read == 0, "expected EOF, got {line:?}");
        Ok(())
    }
}

/// Turns a clean EOF into a connection reset.
struct ResetOnEof(DuplexStream);

impl AsyncRead for ResetOnEof {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        match Pin::new(&mut self.0).poll_read(cx, buf) {
            Poll::Ready(Ok(())) if buf.filled().len() == before && buf.remaining() > 0 => {
                Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()))
            }
            other => other,
        }
    }
}

impl AsyncWrite for ResetOnEof {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}
