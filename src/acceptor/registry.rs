//! Session Registry
//!
//! Insertion-ordered bookkeeping of the sessions an acceptor started.
//!
//! Closed sessions are pruned lazily: [`SessionRegistry::sweep`] runs right
//! before each new session is added, so a session that closed on its own
//! stays listed until the next accept (or until the registry is drained).

use crate::session::SessionHandle;

/// Live sessions of one acceptor, oldest first.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly started session.
    pub fn insert(&mut self, session: SessionHandle) {
        self.sessions.push(session);
    }

    /// Removes every session whose socket is already closed.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(SessionHandle::is_open);
        before - self.sessions.len()
    }

    /// Requests cancellation of every open session and empties the registry.
    ///
    /// Returns the drained handles so callers can wait for their teardown.
    pub fn close_all(&mut self) -> Vec<SessionHandle> {
        let sessions: Vec<SessionHandle> = self.sessions.drain(..).collect();

        for session in sessions.iter().filter(|s| s.is_open()) {
            session.close();
        }

        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionHandle> {
        self.sessions.iter()
    }
}
