//! Protocol Handler Module
//!
//! This module defines the boundary between the server core and the protocol
//! built on top of it. The core owns sockets, buffers and the session
//! lifecycle; a [`Handler`] only ever sees bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  make_handler()  ┌─────────────────┐
//! │ HandlerFactory  │─────────────────>│    Handler      │  one per session
//! │ (shared)        │                  │  (exclusive)    │
//! └─────────────────┘                  └────────┬────────┘
//!                                               │
//!                     input view ──> handle() ──┴──> output buffer
//! ```
//!
//! ## Modules
//!
//! - `contract`: the `Handler` / `HandlerFactory` traits and their result types
//! - `echo`: `LineEcho`, a newline-delimited echo protocol

pub mod contract;
pub mod echo;

pub use contract::{Handled, Handler, HandlerError, HandlerFactory, SharedHandlerFactory};
pub use echo::LineEcho;
