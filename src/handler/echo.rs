//! Line Echo Handler
//!
//! The reference protocol: every request is one line terminated by `\n`,
//! and the response is the same line, terminator included.
//!
//! ```text
//! Request:  ping\n
//! Response: ping\n
//! ```
//!
//! A view without any `\n` is reported as partial data with nothing
//! consumed, so the bytes are kept until the rest of the line arrives.

use crate::handler::{Handled, Handler, HandlerError};
use bytes::BytesMut;
use tracing::{debug, info};

/// Echoes newline-terminated lines back to the peer.
#[derive(Debug, Default)]
pub struct LineEcho {
    /// Lines echoed during this session
    lines: u64,
}

impl LineEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines echoed so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }
}

impl Handler for LineEcho {
    fn at_session_start(&mut self, peer: &str) -> Result<(), HandlerError> {
        info!(peer = %peer, "start session for remote endpoint");
        Ok(())
    }

    fn handle(&mut self, input: &[u8], output: &mut BytesMut) -> Result<Handled, HandlerError> {
        let line_end = match input.iter().position(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => return Ok(Handled::PartialData(0)),
        };

        output.extend_from_slice(&input[..line_end]);
        self.lines += 1;

        Ok(Handled::Success(line_end))
    }

    fn at_session_close(&mut self) {
        debug!(lines = self.lines, "echo session finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_single_line() {
        let mut handler = LineEcho::new();
        let mut out = BytesMut::new();

        let handled = handler.handle(b"ping\n", &mut out).unwrap();

        assert_eq!(handled, Handled::Success(5));
        assert_eq!(&out[..], b"ping\n");
        assert_eq!(handler.lines(), 1);
    }

    #[test]
    fn test_echo_takes_only_first_line() {
        let mut handler = LineEcho::new();
        let mut out = BytesMut::new();

        let handled = handler.handle(b"ping\npong\n", &mut out).unwrap();

        assert_eq!(handled, Handled::Success(5));
        assert_eq!(&out[..], b"ping\n");
    }

    #[test]
    fn test_incomplete_line() {
        let mut handler = LineEcho::new();
        let mut out = BytesMut::new();

        let handled = handler.handle(b"partial", &mut out).unwrap();

        assert_eq!(handled, Handled::PartialData(0));
        assert!(out.is_empty());
        assert_eq!(handler.lines(), 0);
    }

    #[test]
    fn test_empty_line() {
        let mut handler = LineEcho::new();
        let mut out = BytesMut::new();

        assert_eq!(handler.handle(b"\n", &mut out).unwrap(), Handled::Success(1));
        assert_eq!(&out[..], b"\n");
    }
}
