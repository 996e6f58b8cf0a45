//! Transport Module
//!
//! Resolves configuration into a bindable endpoint and wraps the two
//! supported stream transports behind one accept contract.
//!
//! ## Modules
//!
//! - `endpoint`: `TransportKind`, `Endpoint` and address resolution
//! - `listener`: `Listener` (bound socket) and `SessionStream` (accepted socket)

pub mod endpoint;
pub mod listener;

pub use endpoint::{resolve, Endpoint, ResolveError, TransportKind, UnknownTransport};
pub use listener::{Listener, SessionStream};
