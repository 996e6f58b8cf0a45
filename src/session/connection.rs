//! Session Loop
//!
//! One [`Session`] runs per accepted connection, as a single Tokio task.
//! Everything the session owns (socket, buffers, handler) is touched only
//! from that task, so its steps never run concurrently with each other while
//! different sessions proceed in parallel on the runtime's worker threads.
//!
//! ## Session Lifecycle
//!
//! ```text
//!        ┌──────────────────────────────────────────────┐
//!        │                                              │
//!        ▼                                              │
//!   ┌─────────┐  bytes  ┌────────────┐ output? ┌─────────┐
//!   │ Reading │────────>│ Processing │────────>│ Writing │
//!   └────┬────┘         └─────┬──────┘   no ───┴────┬────┘
//!        │                    │        (back to     │
//!        │ EOF / cancel /     │ handler   Reading)  │ cancel / error
//!        │ error              │ error               │
//!        ▼                    ▼                     ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │ Closed: at_session_close(), shutdown, close      │
//!   └──────────────────────────────────────────────────┘
//! ```
//!
//! At most one read or write is outstanding at any time. Cancellation is
//! observed alongside that single operation and never runs teardown itself:
//! the loop exits and teardown happens on this task.
//!
//! ## Limits
//!
//! There are no read, write or idle timeouts, and the input buffer has no
//! upper bound: a peer that never completes a request can grow it freely.

use crate::handler::{Handler, HandlerError};
use crate::session::{process_input, SessionHandle, SessionState};
use crate::stats::ServerStats;
use bytes::BytesMut;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

/// Initial capacity reserved for each input and output buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1000;

/// Per-session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity reserved up front for the input buffer
    pub read_buffer_capacity: usize,
    /// Capacity reserved up front for the output buffer
    pub write_buffer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            write_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer closed its side of the connection
    #[error("end of stream")]
    EndOfStream,

    /// `close()` was requested while an operation was pending
    #[error("operation canceled")]
    Canceled,

    /// Transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The handler reported an error
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl SessionError {
    /// True for the normal ways a session ends: peer EOF or `close()`.
    pub fn is_expected(&self) -> bool {
        matches!(self, SessionError::EndOfStream | SessionError::Canceled)
    }
}

/// State and logic for one accepted connection.
pub struct Session<S> {
    /// The connected socket
    stream: S,

    /// Protocol logic, owned exclusively by this session
    handler: Box<dyn Handler>,

    /// Bytes read but not yet consumed
    input: BytesMut,

    /// Response bytes waiting for the next write
    output: BytesMut,

    /// Shared view of this session (also held by the registry)
    handle: SessionHandle,

    /// Observes `close()` requests
    state_rx: watch::Receiver<SessionState>,

    /// Server-wide counters
    stats: Arc<ServerStats>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a session around a connected stream.
    ///
    /// # Arguments
    ///
    /// * `stream` - The connected socket
    /// * `handler` - The handler made for this connection
    /// * `handle` - Identity and shared state of the session
    /// * `config` - Buffer sizing
    /// * `stats` - Shared server statistics
    pub fn new(
        stream: S,
        handler: Box<dyn Handler>,
        handle: SessionHandle,
        config: SessionConfig,
        stats: Arc<ServerStats>,
    ) -> Self {
        trace!(session = handle.id(), "construct session");

        Self {
            stream,
            handler,
            input: BytesMut::with_capacity(config.read_buffer_capacity),
            output: BytesMut::with_capacity(config.write_buffer_capacity),
            state_rx: handle.subscribe(),
            handle,
            stats,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Notifies the handler that the session starts.
    ///
    /// On error the session must be dropped without running.
    pub fn start(&mut self) -> Result<(), HandlerError> {
        trace!(session = self.handle.id(), "start new session");

        match self.handler.at_session_start(self.handle.peer()) {
            Ok(()) => {
                self.stats.session_opened();
                Ok(())
            }
            Err(e) => {
                warn!(peer = %self.handle.peer(), error = %e, "session doesn't start, handler refused it");
                self.stats.session_rejected();
                Err(e)
            }
        }
    }

    /// Runs the read/process/write loop, then tears the session down.
    ///
    /// Returns the reason the loop ended.
    pub async fn run(mut self) -> SessionError {
        let reason = self.main_loop().await;

        match &reason {
            SessionError::EndOfStream => debug!("client closed connection"),
            SessionError::Canceled => debug!("session canceled"),
            e => error!(error = %e, "session error"),
        }

        self.teardown().await;
        reason
    }

    async fn main_loop(&mut self) -> SessionError {
        loop {
            if let Err(e) = self.step().await {
                return e;
            }
        }
    }

    /// One read, the processing it enables, and at most one write.
    async fn step(&mut self) -> Result<(), SessionError> {
        let n = tokio::select! {
            biased;
            _ = self.state_rx.wait_for(|state| *state != SessionState::Open) => {
                return Err(SessionError::Canceled);
            }
            read = self.stream.read_buf(&mut self.input) => read?,
        };

        if n == 0 {
            return Err(SessionError::EndOfStream);
        }
        self.stats.bytes_read(n);
        trace!(bytes = n, buffered = self.input.len(), "read data");

        let drained = process_input(&mut self.handler, &mut self.input, &mut self.output)?;
        self.stats.requests_handled(drained.requests);
        if drained.retained > 0 {
            trace!(retained = drained.retained, "partial data in request");
        }

        if self.output.is_empty() {
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = self.state_rx.wait_for(|state| *state != SessionState::Open) => {
                return Err(SessionError::Canceled);
            }
            written = write_flush(&mut self.stream, &self.output) => written?,
        }

        self.stats.bytes_written(self.output.len());
        trace!(bytes = self.output.len(), "wrote data");
        self.output.clear();

        Ok(())
    }

    /// Runs once the loop has exited, so no operation is pending.
    async fn teardown(self) {
        let Session {
            mut stream,
            mut handler,
            handle,
            stats,
            ..
        } = self;

        trace!("at session close");
        handle.begin_closing();
        handler.at_session_close();

        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "socket shutdown failed");
        }
        drop(stream);

        handle.mark_closed();
        stats.session_closed();
        debug!("end of session");
    }
}

async fn write_flush<S>(stream: &mut S, buf: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(buf).await?;
    stream.flush().await
}
