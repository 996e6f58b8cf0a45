//! Server Module
//!
//! The public entry point: a [`ServerBuilder`] that validates configuration
//! and binds, and the [`Server`] it produces.
//!
//! ## Lifecycle
//!
//! ```text
//! ServerBuilder::build()  ──> listening, not accepting
//! Server::async_run()     ──> accept loop running in the background
//! Server::stop()          ──> accept canceled, all sessions asked to close
//! Server::shutdown().await──> as stop, then wait for every teardown
//! ```
//!
//! A stopped server does not restart. Dropping a server stops it.

pub mod builder;

pub use builder::{BuildError, ServerBuilder};

use crate::acceptor::Acceptor;
use crate::stats::ServerStats;
use crate::transport::Endpoint;
use std::sync::Arc;

/// A bound stream server.
pub struct Server {
    acceptor: Acceptor,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Starts accepting in the background and returns immediately.
    pub fn async_run(&self) -> &Self {
        self.acceptor.start();
        self
    }

    /// Stops accepting and closes every session. Returns without waiting.
    pub fn stop(&self) -> &Self {
        self.acceptor.stop();
        self
    }

    /// Stops the server and waits until every session has torn down.
    pub async fn shutdown(&self) {
        self.acceptor.shutdown().await;
    }

    /// The bound endpoint, with the real port when 0 was requested.
    pub fn local_endpoint(&self) -> &Endpoint {
        self.acceptor.local_endpoint()
    }

    /// Registered sessions, including closed ones not yet swept.
    pub fn session_count(&self) -> usize {
        self.acceptor.session_count()
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        self.acceptor.stats()
    }
}
