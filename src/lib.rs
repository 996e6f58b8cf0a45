//! # FlashStream - An Asynchronous Stream Server Core
//!
//! FlashStream accepts TCP or Unix-domain stream connections and runs each one
//! through a pluggable, per-connection protocol handler. The library owns the
//! socket plumbing; the handler owns the bytes.
//!
//! ## Features
//!
//! - **Two Transports**: TCP (`ip:port`) and Unix-domain sockets (a path)
//! - **Pipelining**: Several complete requests in one read are all handled
//!   before a single write of the combined output
//! - **Partial Requests**: Incomplete trailing data waits for the next read
//! - **Orderly Shutdown**: Stopping the server cancels every session and each
//!   handler sees exactly one close notification
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              FlashStream                                │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Server    │───>│  Acceptor   │───>│  Listener   │ TCP / Unix       │
//! │  │  (Builder)  │    │ (accept     │    │             │                  │
//! │  └─────────────┘    │  loop)      │    └─────────────┘                  │
//! │                     └──────┬──────┘                                     │
//! │                            │ make_handler()                             │
//! │                            ▼                                            │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     SessionRegistry                              │  │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐                          │  │
//! │  │  │Session 1 │ │Session 2 │ │Session N │  one Tokio task each     │  │
//! │  │  │read      │ │read      │ │read      │                          │  │
//! │  │  │handle    │ │handle    │ │handle    │                          │  │
//! │  │  │write     │ │write     │ │write     │                          │  │
//! │  │  └──────────┘ └──────────┘ └──────────┘                          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashstream::{LineEcho, Server, TransportKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::builder()
//!         .endpoint(TransportKind::Tcp, "127.0.0.1:7000")
//!         .handler_factory(LineEcho::new)
//!         .build()?;
//!
//!     server.async_run();
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`handler`]: The handler contract and the `LineEcho` demo handler
//! - [`transport`]: Endpoint parsing, listeners and accepted streams
//! - [`session`]: The per-connection read / handle / write loop
//! - [`acceptor`]: The accept loop and the session registry
//! - [`server`]: `ServerBuilder` and `Server`
//! - [`stats`]: Counters shared by every component
//!
//! ## Design Highlights
//!
//! ### One Task Per Session
//!
//! All work for a connection (reading, calling the handler, writing) runs on
//! that connection's task, so a handler never sees concurrent calls. At most
//! one read or one write is outstanding at any time.
//!
//! ### Lazy Registry Sweep
//!
//! Sessions that close on their own are removed from the registry right
//! before the next session is added, not immediately.
//!
//! ### Known Limits
//!
//! There are no read or write timeouts and the input buffer has no upper
//! bound. A peer that never completes a request keeps its buffer growing.

pub mod acceptor;
pub mod handler;
pub mod server;
pub mod session;
pub mod stats;
pub mod transport;

// Re-export commonly used types for convenience
pub use handler::{Handled, Handler, HandlerError, HandlerFactory, LineEcho, SharedHandlerFactory};
pub use server::{BuildError, Server, ServerBuilder};
pub use session::{SessionConfig, SessionError, SessionHandle, SessionState};
pub use stats::ServerStats;
pub use transport::{Endpoint, ResolveError, TransportKind, UnknownTransport};

/// Version of FlashStream
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
