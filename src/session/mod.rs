//! Session Module
//!
//! This module manages individual client connections. Each accepted socket
//! becomes a [`Session`] running in its own async task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Handler     │───>│ Write all   │      │
//! │  │ (>= 1 byte) │    │ (pipelined) │    │ output      │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                                             │
//! │  SessionHandle ── state: Open -> Closing -> Closed          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `connection`: the `Session` loop, its configuration and exit reasons
//! - `handle`: `SessionHandle` and `SessionState`
//! - `process`: draining the input buffer through the handler

pub mod connection;
pub mod handle;
pub mod process;

pub use connection::{Session, SessionConfig, SessionError, DEFAULT_BUFFER_CAPACITY};
pub use handle::{SessionHandle, SessionState};
pub use process::{process_input, Drained};
