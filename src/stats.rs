//! Server Statistics
//!
//! Lock-free counters shared by the acceptor and every session through an
//! `Arc<ServerStats>`. An embedding application can pass its own instance to
//! the builder to observe a running server.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for sessions and traffic.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Total number of sessions accepted and started
    pub sessions_accepted: AtomicU64,
    /// Sessions currently between start and the end of teardown
    pub active_sessions: AtomicU64,
    /// Sessions whose handler refused to start
    pub sessions_rejected: AtomicU64,
    /// Total requests handled to completion
    pub requests_handled: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_opened(&self) {
        self.sessions_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn session_rejected(&self) {
        self.sessions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_handled(&self, count: usize) {
        self.requests_handled
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Number of sessions currently active.
    pub fn active(&self) -> u64 {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Number of sessions accepted so far.
    pub fn accepted(&self) -> u64 {
        self.sessions_accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.sessions_rejected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_counters() {
        let stats = ServerStats::new();

        stats.session_opened();
        stats.session_opened();
        stats.session_closed();
        stats.session_rejected();

        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.active(), 1);
        assert_eq!(stats.sessions_rejected.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_traffic_counters() {
        let stats = ServerStats::new();

        stats.bytes_read(10);
        stats.bytes_written(4);
        stats.requests_handled(2);

        assert_eq!(stats.bytes_read.load(Ordering::Relaxed), 10);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 4);
        assert_eq!(stats.requests_handled.load(Ordering::Relaxed), 2);
    }
}
