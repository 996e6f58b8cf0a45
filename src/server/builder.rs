//! Server Builder
//!
//! Collects a handler factory and an endpoint, validates them, and binds the
//! listener. Every failure here is fatal: `build()` either returns a server
//! that is listening or an error explaining why it could not.

use crate::acceptor::Acceptor;
use crate::handler::{HandlerFactory, SharedHandlerFactory};
use crate::server::Server;
use crate::session::SessionConfig;
use crate::stats::ServerStats;
use crate::transport::{resolve, Endpoint, Listener, ResolveError, TransportKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, Span};

/// Errors raised while building a server.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No handler factory was set
    #[error("invalid request handler factory: none was set")]
    MissingHandlerFactory,

    /// No endpoint was set
    #[error("no endpoint was set")]
    MissingEndpoint,

    /// The address string could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The listener could not be created, bound or put into listening mode
    #[error("failed to listen on {endpoint}: {source}")]
    Bind {
        endpoint: Endpoint,
        #[source]
        source: std::io::Error,
    },
}

/// Assembles a [`Server`].
///
/// # Example
///
/// ```ignore
/// use flashstream::{LineEcho, ServerBuilder, TransportKind};
///
/// let server = ServerBuilder::new()
///     .endpoint(TransportKind::Tcp, "127.0.0.1:7000")
///     .handler_factory(LineEcho::new)
///     .build()?;
///
/// server.async_run();
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    factory: Option<SharedHandlerFactory>,
    endpoint: Option<(TransportKind, String)>,
    config: SessionConfig,
    stats: Option<Arc<ServerStats>>,
    span: Option<Span>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factory that makes one handler per connection.
    pub fn handler_factory<F: HandlerFactory>(self, factory: F) -> Self {
        self.shared_handler_factory(Arc::new(factory))
    }

    /// Sets an already shared handler factory.
    pub fn shared_handler_factory(mut self, factory: SharedHandlerFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets the transport and its address string (`host:port` or a path).
    pub fn endpoint(mut self, kind: TransportKind, address: impl Into<String>) -> Self {
        self.endpoint = Some((kind, address.into()));
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing statistics instance with the server.
    pub fn stats(mut self, stats: Arc<ServerStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Attaches the server's spans under `span` instead of the current one.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Validates the configuration and binds the listener.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Server, BuildError> {
        let factory = self.factory.ok_or(BuildError::MissingHandlerFactory)?;
        let (kind, address) = self.endpoint.ok_or(BuildError::MissingEndpoint)?;

        let endpoint = resolve(kind, &address)?;
        debug!(endpoint = %endpoint, transport = %kind, "listen endpoint");

        let listener = Listener::bind(&endpoint).map_err(|source| BuildError::Bind {
            endpoint: endpoint.clone(),
            source,
        })?;

        let span = self.span.unwrap_or_else(Span::current);
        let acceptor = Acceptor::new(
            listener,
            factory,
            self.config,
            self.stats.unwrap_or_default(),
            &span,
        )
        .map_err(|source| BuildError::Bind { endpoint, source })?;

        span.in_scope(|| {
            info!(endpoint = %acceptor.local_endpoint(), transport = %kind, "server listening")
        });

        Ok(Server { acceptor })
    }
}
