//! The Handler Contract
//!
//! A [`Handler`] is the protocol logic for exactly one session. The session
//! owns it exclusively and only ever touches it from its own task, so a
//! handler can keep whatever mutable protocol state it likes without locks.
//!
//! ## Lifecycle
//!
//! ```text
//! HandlerFactory::make_handler()
//!        │
//!        ▼
//! at_session_start(peer) ──Err──> session abandoned (never registered)
//!        │ Ok
//!        ▼
//! ┌───────────────────────────────┐
//! │ handle(view, output)  (0..N)  │  called repeatedly per read
//! └───────────────────────────────┘
//!        │
//!        ▼
//! at_session_close()               exactly once, before the socket closes
//! ```
//!
//! ## Consumed length
//!
//! Every call to [`Handler::handle`] reports how many leading bytes of the
//! view it consumed, through [`Handled`]:
//!
//! - `Handled::Success(n)` with `0 < n < view.len()`: one request handled,
//!   the session calls `handle` again on the remaining bytes (pipelining).
//! - `Handled::Success(0)` or `Handled::Success(n >= view.len())`: the whole
//!   buffer is treated as drained and cleared.
//! - `Handled::PartialData(n)`: the view does not hold a complete request.
//!   The first `n` bytes are dropped and the rest is kept for the next read.

use bytes::BytesMut;
use std::sync::Arc;
use thiserror::Error;

/// Result of a successful [`Handler::handle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// A complete request was handled; carries the number of bytes consumed.
    Success(usize),

    /// The view holds no complete request. Carries the number of leading
    /// bytes to discard before the incomplete remainder.
    PartialData(usize),
}

impl Handled {
    /// The consumed length reported by the handler.
    pub fn consumed(&self) -> usize {
        match *self {
            Handled::Success(n) | Handled::PartialData(n) => n,
        }
    }
}

/// Errors a handler can report. Any of them ends the session.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler refused the session in `at_session_start`
    #[error("session rejected: {0}")]
    Rejected(String),

    /// The peer violated the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O performed by the handler itself failed
    #[error("handler I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        HandlerError::Rejected(reason.into())
    }

    pub fn protocol(reason: impl Into<String>) -> Self {
        HandlerError::Protocol(reason.into())
    }
}

/// Per-connection protocol logic.
pub trait Handler: Send + 'static {
    /// Called once before the first read, with the peer address as text.
    ///
    /// Returning an error aborts the session before any I/O happens.
    fn at_session_start(&mut self, _peer: &str) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Handles the unconsumed bytes in `input`, appending any response
    /// bytes to `output`.
    ///
    /// May be called several times per read. Must never report a consumed
    /// length larger than `input.len()`.
    fn handle(&mut self, input: &[u8], output: &mut BytesMut) -> Result<Handled, HandlerError>;

    /// Called exactly once during teardown, after cancellation was requested
    /// and before the socket is closed.
    fn at_session_close(&mut self) {}
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn at_session_start(&mut self, peer: &str) -> Result<(), HandlerError> {
        (**self).at_session_start(peer)
    }

    fn handle(&mut self, input: &[u8], output: &mut BytesMut) -> Result<Handled, HandlerError> {
        (**self).handle(input, output)
    }

    fn at_session_close(&mut self) {
        (**self).at_session_close()
    }
}

/// Manufactures one [`Handler`] per accepted connection.
pub trait HandlerFactory: Send + Sync + 'static {
    fn make_handler(&self) -> Box<dyn Handler>;
}

impl<F, H> HandlerFactory for F
where
    F: Fn() -> H + Send + Sync + 'static,
    H: Handler,
{
    fn make_handler(&self) -> Box<dyn Handler> {
        Box::new(self())
    }
}

/// A shared, type-erased handler factory.
pub type SharedHandlerFactory = Arc<dyn HandlerFactory>;
