//! Session lifecycle orchestration.
//!
//! One task per session drives it from resolution to the final disconnect:
//! - Phase 1: resolve and connect through the service's connector
//! - Phase 2: read loop, with a writer task draining the outbound queue
//! - Phase 3: teardown, fault reporting and the disconnect event

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use slirc_proto::{Line, LineCodec};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, ReadHalf};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::codec::FramedRead;
use tracing::{Instrument, Span, debug, info, warn};

use super::error_handling::classify_read_error;
use super::{Session, SessionState};
use crate::dispatch::{self, DispatchOrder};
use crate::error::{ReadFailure, SessionError, WriteFailure};
use crate::transport::BoxedStream;

/// How long queued lines may take to flush once the session is closing.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// How phase 1 ended without a stream.
enum Aborted {
    /// `disconnect()` won the race; no events fire.
    Cancelled,
    Failed(SessionError),
}

/// Where complete lines go once read.
enum LineSink {
    Ordered {
        queue: mpsc::UnboundedSender<BytesMut>,
        worker: JoinHandle<()>,
    },
    Concurrent {
        tasks: JoinSet<()>,
    },
}

impl LineSink {
    fn new(session: &Arc<Session>) -> Self {
        match session.dispatch_order {
            DispatchOrder::Ordered => {
                let (queue, mut lines) = mpsc::unbounded_channel::<BytesMut>();
                let session = Arc::clone(session);
                let worker = tokio::spawn(
                    async move {
                        while let Some(line) = lines.recv().await {
                            session.handle_line(&line);
                        }
                    }
                    .instrument(Span::current()),
                );
                LineSink::Ordered { queue, worker }
            }
            DispatchOrder::Concurrent => LineSink::Concurrent {
                tasks: JoinSet::new(),
            },
        }
    }

    fn submit(&mut self, session: &Arc<Session>, line: BytesMut) {
        match self {
            LineSink::Ordered { queue, .. } => {
                // The worker only stops once the queue is dropped.
                let _ = queue.send(line);
            }
            LineSink::Concurrent { tasks } => {
                let session = Arc::clone(session);
                tasks.spawn(async move { session.handle_line(&line) }.instrument(Span::current()));
            }
        }
    }

    /// Resolves when a concurrent dispatch task finishes; never for ordered.
    async fn reap(&mut self) -> Option<()> {
        match self {
            LineSink::Concurrent { tasks } if !tasks.is_empty() => {
                tasks.join_next().await.map(|_| ())
            }
            _ => std::future::pending().await,
        }
    }

    /// Wait until every submitted line has been dispatched.
    async fn finish(self) {
        match self {
            LineSink::Ordered { queue, worker } => {
                drop(queue);
                if let Err(e) = worker.await {
                    warn!(error = %e, "dispatch worker failed");
                }
            }
            LineSink::Concurrent { mut tasks } => while tasks.join_next().await.is_some() {},
        }
    }
}

impl Session {
    pub(super) async fn run(self: Arc<Self>, outbound: mpsc::UnboundedReceiver<Bytes>) {
        match self.establish().await {
            Ok(stream) => self.serve(stream, outbound).await,
            Err(Aborted::Cancelled) => {
                debug!("connection attempt abandoned");
            }
            Err(Aborted::Failed(error)) => {
                warn!(error = %error, code = error.error_code(), "session failed");
                self.advance(SessionState::Disconnecting);
                dispatch::fault(&self, &error);
            }
        }

        self.advance(SessionState::Disconnected);
        self.service.deregister(self.id);
    }

    /// Phase 1: resolve and connect, giving up if `disconnect()` is called.
    async fn establish(&self) -> Result<BoxedStream, Aborted> {
        let connector = self.service.connector();

        let addrs = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Aborted::Cancelled),
            result = connector.resolve(&self.host, self.port) => {
                result.map_err(|e| Aborted::Failed(SessionError::Resolution(e)))?
            }
        };
        debug!(count = addrs.len(), "resolved");

        if !self.advance(SessionState::Connecting) {
            return Err(Aborted::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Aborted::Cancelled),
            result = connector.connect(&addrs) => {
                result.map_err(|e| Aborted::Failed(SessionError::Connection(e)))
            }
        }
    }

    /// Phases 2 and 3.
    async fn serve(self: &Arc<Self>, stream: BoxedStream, outbound: mpsc::UnboundedReceiver<Bytes>) {
        let (read_half, write_half) = tokio::io::split(stream);
        *self.writer.lock().await = Some(write_half);

        if !self.advance(SessionState::Connected) {
            debug!("disconnected while connecting");
            self.close_writer().await;
            return;
        }
        info!("connected");

        let writer = tokio::spawn(Arc::clone(self).write_loop(outbound).instrument(Span::current()));
        dispatch::connect(self);

        let failure = self.read_loop(read_half).await;

        self.advance(SessionState::Disconnecting);
        self.cancel.cancel();
        if let Err(e) = writer.await {
            warn!(error = %e, "writer task failed");
        }

        if failure.is_orderly() {
            info!(reason = %failure, "disconnected");
        } else {
            let error = SessionError::Read(failure);
            warn!(error = %error, "transport fault");
            dispatch::fault(self, &error);
        }
        let write_fault = self.write_fault.lock().take();
        if let Some(e) = write_fault {
            let error = SessionError::Write(WriteFailure::Io(e));
            warn!(error = %error, "write fault");
            dispatch::fault(self, &error);
        }

        dispatch::disconnect(self);
    }

    async fn read_loop(self: &Arc<Self>, read_half: ReadHalf<BoxedStream>) -> ReadFailure {
        let mut lines = FramedRead::new(read_half, LineCodec::with_max_len(self.max_line_len));
        let mut sink = LineSink::new(self);

        let failure = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break ReadFailure::LocalClosed,
                Some(()) = sink.reap() => {}
                next = lines.next() => match next {
                    Some(Ok(Line::Complete(line))) => sink.submit(self, line),
                    Some(Ok(Line::Discarded { length })) => {
                        warn!(length, limit = self.max_line_len, "discarded overlong line");
                    }
                    Some(Err(e)) => break classify_read_error(e),
                    None => break ReadFailure::RemoteClosed,
                },
            }
        };

        sink.finish().await;
        failure
    }

    fn handle_line(&self, line: &[u8]) {
        match slirc_proto::parse(line) {
            Ok(message) => dispatch::dispatch(self, &message),
            Err(e) => debug!(
                error = %e,
                code = e.error_code(),
                line = %String::from_utf8_lossy(line).trim_end(),
                "dropping malformed line"
            ),
        }
    }

    async fn write_loop(self: Arc<Self>, mut outbound: mpsc::UnboundedReceiver<Bytes>) {
        // The grace period starts at the close; a peer that stopped reading
        // cannot hold the teardown beyond it.
        let flushed = tokio::select! {
            biased;
            () = self.pump(&mut outbound) => true,
            () = async {
                self.cancel.cancelled().await;
                tokio::time::sleep(CLOSE_GRACE).await;
            } => false,
        };
        if !flushed {
            warn!(grace = ?CLOSE_GRACE, "peer is not reading, abandoning flush");
        }

        outbound.close();
        let mut dropped = 0usize;
        while outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(dropped, "unsent lines dropped at close");
        }
        self.close_writer().await;
    }

    /// Write queued frames until the close, then flush what was queued
    /// before it. Returns early on a write failure.
    async fn pump(&self, outbound: &mut mpsc::UnboundedReceiver<Bytes>) {
        loop {
            let frame = tokio::select! {
                biased;
                frame = outbound.recv() => match frame {
                    Some(frame) => frame,
                    None => return,
                },
                _ = self.cancel.cancelled() => break,
            };
            if let Err(e) = self.write_frame(&frame).await {
                debug!(error = %e, "write failed");
                // Once closing, a failed write is part of the close.
                if !self.cancel.is_cancelled() {
                    *self.write_fault.lock() = Some(e);
                    self.cancel.cancel();
                }
                return;
            }
        }

        outbound.close();
        while let Ok(frame) = outbound.try_recv() {
            if let Err(e) = self.write_frame(&frame).await {
                debug!(error = %e, "dropping queued lines after write failure");
                return;
            }
        }
    }

    async fn write_frame(&self, frame: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(writer) => {
                writer.write_all(frame).await?;
                writer.flush().await
            }
            None => Err(std::io::ErrorKind::NotConnected.into()),
        }
    }

    async fn close_writer(&self) {
        let writer = self.writer.lock().await.take();
        let Some(mut writer) = writer else {
            return;
        };
        match tokio::time::timeout(CLOSE_GRACE, writer.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "transport shutdown failed"),
            Err(_) => debug!("transport shutdown timed out"),
        }
    }
}
