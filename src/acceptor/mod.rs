//! Acceptor Module
//!
//! Owns the listening socket and every session it produced.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Acceptor                             │
//! │                                                             │
//! │  Listener ──accept──> HandlerFactory ──> Session (task)     │
//! │                                             │               │
//! │                                             ▼               │
//! │                      SessionRegistry [h1, h2, h3, ...]      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `accept`: the `Acceptor` and its accept loop
//! - `registry`: `SessionRegistry`, the insertion-ordered session list

pub mod accept;
pub mod registry;

pub use accept::Acceptor;
pub use registry::SessionRegistry;
