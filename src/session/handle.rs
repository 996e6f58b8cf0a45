//! Session Handles
//!
//! A [`SessionHandle`] is the shared, clonable view of one session. The
//! session task keeps one copy and the acceptor's registry keeps another;
//! the underlying state lives as long as either does.
//!
//! The state is published through a `watch` channel. The session loop waits
//! for it to leave `Open`, which is how `close()` cancels the single pending
//! read or write without touching the socket from another task.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{trace, warn};

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading, processing or writing
    Open,
    /// Cancellation requested or teardown in progress
    Closing,
    /// Teardown finished, socket closed
    Closed,
}

#[derive(Debug)]
struct Shared {
    id: u64,
    peer: String,
    state: watch::Sender<SessionState>,
}

/// Clonable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    pub(crate) fn new(id: u64, peer: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Open);

        Self {
            shared: Arc::new(Shared {
                id,
                peer: peer.into(),
                state,
            }),
        }
    }

    /// Identifier unique within the owning server.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Remote peer address text.
    pub fn peer(&self) -> &str {
        &self.shared.peer
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// True until teardown has closed the socket.
    pub fn is_open(&self) -> bool {
        self.state() != SessionState::Closed
    }

    /// Requests cancellation of the session's pending operation.
    ///
    /// Returns immediately. Teardown runs later on the session's own task;
    /// use [`SessionHandle::closed`] to wait for it.
    pub fn close(&self) {
        match self.state() {
            SessionState::Closed => {
                warn!(session = self.id(), "session already closed");
            }
            SessionState::Closing => {
                trace!(session = self.id(), "session already closing");
            }
            SessionState::Open => {
                trace!(session = self.id(), "close session");
                self.begin_closing();
            }
        }
    }

    /// Resolves once the session reached [`SessionState::Closed`].
    pub async fn closed(&self) {
        let mut rx = self.shared.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|state| *state == SessionState::Closed).await;
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Moves `Open` to `Closing`; any other state is left alone.
    pub(crate) fn begin_closing(&self) -> bool {
        self.shared.state.send_if_modified(|state| {
            if *state == SessionState::Open {
                *state = SessionState::Closing;
                true
            } else {
                false
            }
        })
    }

    pub(crate) fn mark_closed(&self) {
        self.shared.state.send_replace(SessionState::Closed);
    }
}
