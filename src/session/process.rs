//! Input Processing
//!
//! Runs the handler over everything buffered after a read, before the next
//! I/O operation is issued.
//!
//! ```text
//! input:  [ req1 | req2 | partial... ]
//!           ▲      ▲      ▲
//!           │      │      └── PartialData: drop everything before, keep tail
//!           │      └── Success(n): advance the view, call handle() again
//!           └── view starts here
//! ```
//!
//! Splitting a byte stream across reads at any point produces the same
//! sequence of completed requests as delivering it in one read, because the
//! unconsumed tail is always retained exactly.

use crate::handler::{Handled, Handler, HandlerError};
use bytes::{Buf, BytesMut};

/// What one pass over the input buffer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    /// Requests the handler completed
    pub requests: usize,
    /// Bytes kept in the input buffer for the next read
    pub retained: usize,
}

/// Feeds `input` to `handler` until it is drained or holds only a partial
/// request. Response bytes accumulate in `output`.
///
/// A handler error aborts the pass; the caller closes the session.
pub fn process_input<H>(
    handler: &mut H,
    input: &mut BytesMut,
    output: &mut BytesMut,
) -> Result<Drained, HandlerError>
where
    H: Handler + ?Sized,
{
    let mut offset = 0;
    let mut requests = 0;

    while offset < input.len() {
        let view = &input[offset..];
        let remaining = view.len();

        match handler.handle(view, output)? {
            Handled::Success(consumed) => {
                debug_assert!(consumed <= remaining, "handler consumed past the view");
                requests += 1;

                if consumed == 0 || consumed >= remaining {
                    break;
                }
                offset += consumed;
            }
            Handled::PartialData(consumed) => {
                debug_assert!(consumed <= remaining, "handler consumed past the view");

                input.advance(offset + consumed.min(remaining));
                return Ok(Drained {
                    requests,
                    retained: input.len(),
                });
            }
        }
    }

    input.clear();
    Ok(Drained {
        requests,
        retained: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::LineEcho;

    /// Records every call and its result.
    #[derive(Default)]
    struct Recorder {
        inner: LineEcho,
        calls: Vec<(Vec<u8>, Handled)>,
    }

    impl Handler for Recorder {
        fn handle(&mut self, input: &[u8], output: &mut BytesMut) -> Result<Handled, HandlerError> {
            let handled = self.inner.handle(input, output)?;
            self.calls.push((input.to_vec(), handled));
            Ok(handled)
        }
    }

    /// Skips leading `#` bytes, then needs a full `;`-terminated request.
    struct SkipHashes;

    impl Handler for SkipHashes {
        fn handle(&mut self, input: &[u8], output: &mut BytesMut) -> Result<Handled, HandlerError> {
            let skip = input.iter().take_while(|&&b| b == b'#').count();
            match input[skip..].iter().position(|&b| b == b';') {
                Some(pos) => {
                    output.extend_from_slice(&input[skip..skip + pos]);
                    Ok(Handled::Success(skip + pos + 1))
                }
                None => Ok(Handled::PartialData(skip)),
            }
        }
    }

    struct Always(Handled);

    impl Handler for Always {
        fn handle(&mut self, _input: &[u8], _output: &mut BytesMut) -> Result<Handled, HandlerError> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl Handler for Failing {
        fn handle(&mut self, _input: &[u8], _output: &mut BytesMut) -> Result<Handled, HandlerError> {
            Err(HandlerError::protocol("bad request"))
        }
    }

    /// Delivers `chunks` one read at a time; returns successful consumed
    /// lengths and the concatenated output.
    fn deliver(chunks: &[&[u8]]) -> (Vec<usize>, Vec<u8>) {
        let mut handler = Recorder::default();
        let mut input = BytesMut::new();
        let mut output = BytesMut::new();
        let mut written = Vec::new();

        for chunk in chunks {
            input.extend_from_slice(chunk);
            process_input(&mut handler, &mut input, &mut output).unwrap();
            written.extend_from_slice(&output);
            output.clear();
        }

        let consumed = handler
            .calls
            .iter()
            .filter_map(|(_, handled)| match handled {
                Handled::Success(n) => Some(*n),
                Handled::PartialData(_) => None,
            })
            .collect();
        (consumed, written)
    }

    #[test]
    fn test_pipelined_requests_in_one_read() {
        let mut handler = Recorder::default();
        let mut input = BytesMut::from(&b"ping\npong\n"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut handler, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 2, retained: 0 });
        assert!(input.is_empty());
        assert_eq!(&output[..], b"ping\npong\n");
        assert_eq!(
            handler.calls,
            vec![
                (b"ping\npong\n".to_vec(), Handled::Success(5)),
                (b"pong\n".to_vec(), Handled::Success(5)),
            ]
        );
    }

    #[test]
    fn test_partial_request_is_retained() {
        let mut handler = Recorder::default();
        let mut input = BytesMut::from(&b"partial"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut handler, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 0, retained: 7 });
        assert_eq!(&input[..], b"partial");
        assert!(output.is_empty());
        assert_eq!(handler.calls, vec![(b"partial".to_vec(), Handled::PartialData(0))]);

        input.extend_from_slice(b"\n");
        let drained = process_input(&mut handler, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 1, retained: 0 });
        assert_eq!(&output[..], b"partial\n");
        assert_eq!(handler.calls[1], (b"partial\n".to_vec(), Handled::Success(8)));
    }

    #[test]
    fn test_tail_after_complete_request_is_retained() {
        let mut handler = LineEcho::new();
        let mut input = BytesMut::from(&b"ping\npar"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut handler, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 1, retained: 3 });
        assert_eq!(&input[..], b"par");
        assert_eq!(&output[..], b"ping\n");
    }

    #[test]
    fn test_partial_data_drops_reported_prefix() {
        let mut input = BytesMut::from(&b"a;##bc"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut SkipHashes, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 1, retained: 2 });
        assert_eq!(&input[..], b"bc");
        assert_eq!(&output[..], b"a");
    }

    #[test]
    fn test_zero_consumed_success_drains_buffer() {
        let mut input = BytesMut::from(&b"anything"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut Always(Handled::Success(0)), &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 1, retained: 0 });
        assert!(input.is_empty());
    }

    #[test]
    fn test_consuming_whole_view_drains_buffer() {
        let mut input = BytesMut::from(&b"abc"[..]);
        let mut output = BytesMut::new();

        let drained = process_input(&mut Always(Handled::Success(3)), &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 1, retained: 0 });
        assert!(input.is_empty());
    }

    #[test]
    fn test_handler_error_aborts() {
        let mut input = BytesMut::from(&b"abc"[..]);
        let mut output = BytesMut::new();

        let err = process_input(&mut Failing, &mut input, &mut output).unwrap_err();
        assert!(matches!(err, HandlerError::Protocol(_)));
    }

    #[test]
    fn test_empty_input_does_not_call_handler() {
        let mut handler = Recorder::default();
        let mut input = BytesMut::new();
        let mut output = BytesMut::new();

        let drained = process_input(&mut handler, &mut input, &mut output).unwrap();

        assert_eq!(drained, Drained { requests: 0, retained: 0 });
        assert!(handler.calls.is_empty());
    }

    #[test]
    fn test_any_split_matches_single_read() {
        let stream: &[u8] = b"ping\npong\nhello world\n\nlast\n";
        let expected = deliver(&[stream]);
        assert_eq!(expected.0, vec![5, 5, 12, 1, 5]);
        assert_eq!(expected.1, stream);

        for split in 1..stream.len() {
            let (head, tail) = stream.split_at(split);
            assert_eq!(deliver(&[head, tail]), expected, "split at {split}");
        }

        let bytes: Vec<&[u8]> = stream.chunks(1).collect();
        assert_eq!(deliver(&bytes), expected);
    }
}
