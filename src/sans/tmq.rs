//! Framer for TMQ sentences carrying binary payloads.
//!
//! A TMQ sentence looks like `$PTMQA,<payload>*HH\r\n`, where the payload is
//! raw bytes and may contain any of `$`, `*`, `\r` or `\n`. Splitting on line
//! endings is therefore unsafe. Instead, frames are located by their `$PTMQ`
//! anchor, and end at the first closing pattern (`*`, two hex digits, `\r\n`)
//! that is followed by the start of another sentence or a line ending.
//!
//! Anything between frames (standard sentences in a mixed stream) is
//! discarded. Emitted frames keep their `$` and checksum and lose their CRLF.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use log::{debug, trace, warn};
use thiserror::Error;

/// Structural prefix opening every TMQ frame.
pub const ANCHOR: &[u8] = b"$PTMQ";

/// Default number of bytes discarded before giving up on finding an anchor.
pub const DEFAULT_ANCHOR_LIMIT: usize = 64 * 1024;

/// `*HH\r\n`
const CLOSE_LEN: usize = 5;

/// An error framing TMQ sentences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// No anchor was ever found, the input is probably not TMQ data.
    #[error("No TMQ frame anchor found in {scanned} bytes.")]
    NoFrameAnchorFound { scanned: usize },
}

/// Buffers TMQ sentences across chunks.
///
/// Input must be the exact bytes of the stream. Text-decoding it first may
/// corrupt payloads.
#[derive(Debug)]
pub struct TmqFramer {
    pending: Vec<u8>,
    anchor_limit: usize,
    seen_anchor: bool,
    scanned: usize,
    failed: bool,
}

/// A frame found at the start of the buffer.
struct Envelope {
    /// Length of the frame itself.
    len: usize,
    /// Offset at which scanning for the next frame resumes.
    resume: usize,
}

/// Not enough data to decide where the frame at the start of the buffer ends.
struct Incomplete;

impl Default for TmqFramer {
    fn default() -> Self {
        Self::with_anchor_limit(DEFAULT_ANCHOR_LIMIT)
    }
}

impl TmqFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a framer failing once `limit` bytes have been discarded without
    /// any anchor being found.
    pub fn with_anchor_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            anchor_limit: limit,
            seen_anchor: false,
            scanned: 0,
            failed: false,
        }
    }

    /// The bytes held back from earlier chunks.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Append a chunk, returning every frame it completes.
    ///
    /// Once [`FramingError::NoFrameAnchorFound`] has been returned, every
    /// further call returns it again until the framer is [reset](Self::reset).
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, FramingError> {
        if self.failed {
            return Err(FramingError::NoFrameAnchorFound {
                scanned: self.scanned,
            });
        }

        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;

        loop {
            let buf = &self.pending[start..];

            let Some(anchor) = find(buf, ANCHOR) else {
                // Keep what could be the beginning of an anchor.
                let skip = buf.len() - partial_anchor_len(buf);
                self.discard(skip);
                start += skip;
                break;
            };

            self.discard(anchor);
            self.seen_anchor = true;
            start += anchor;

            match envelope(&self.pending[start..], false) {
                Left(Envelope { len, resume }) => {
                    frames.push(self.pending[start..start + len].to_vec());
                    start += resume;
                }
                Right(Incomplete) => break,
            }
        }

        self.pending.drain(..start);

        trace!(
            "framed {} TMQ sentences, {} bytes pending",
            frames.len(),
            self.pending.len()
        );

        if !self.seen_anchor && self.scanned > self.anchor_limit {
            warn!("no TMQ anchor in the first {} bytes", self.scanned);
            self.failed = true;

            return Err(FramingError::NoFrameAnchorFound {
                scanned: self.scanned,
            });
        }

        Ok(frames)
    }

    /// Flush the pending frame, once the stream has ended.
    ///
    /// The end of the stream stands in for the byte after the closing
    /// pattern. A frame without any closing pattern is flushed whole, minus
    /// trailing line endings.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let tail = core::mem::take(&mut self.pending);

        if !tail.starts_with(ANCHOR) {
            return None;
        }

        let len = match envelope(&tail, true) {
            Left(Envelope { len, .. }) => len,
            Right(Incomplete) => trim_line_end(&tail),
        };

        debug!("flushing {len} byte TMQ sentence at end of stream");

        Some(tail[..len].to_vec())
    }

    /// Discard all buffered data and forget any earlier failure.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.seen_anchor = false;
        self.scanned = 0;
        self.failed = false;
    }

    fn discard(&mut self, n: usize) {
        if !self.seen_anchor {
            self.scanned += n;
        }
    }
}

/// Locate the end of the frame opening `buf`.
///
/// With `at_end`, no more data will follow `buf`.
fn envelope(buf: &[u8], at_end: bool) -> Either<Envelope, Incomplete> {
    let next = find(&buf[ANCHOR.len()..], ANCHOR).map(|i| i + ANCHOR.len());
    let end = next.unwrap_or(buf.len());

    let mut from = ANCHOR.len();

    while let Some(i) = buf[from..end].iter().position(|&b| b == b'*') {
        let star = from + i;
        let close = star + CLOSE_LEN;

        if buf.get(star..close).is_some_and(is_closing) {
            let envelope = Envelope {
                len: star + 3,
                resume: close,
            };

            match buf.get(close) {
                Some(b'$' | b'\r' | b'\n') => return Left(envelope),
                None if at_end => return Left(envelope),
                None => return Right(Incomplete),
                Some(_) => {} // Payload.
            }
        }

        from = star + 1;
    }

    match next {
        Some(next) => {
            warn!("TMQ sentence without closing pattern, cut at next anchor");

            Left(Envelope {
                len: trim_line_end(&buf[..next]),
                resume: next,
            })
        }
        None => Right(Incomplete),
    }
}

/// Whether `r` is `*HH\r\n`.
fn is_closing(r: &[u8]) -> bool {
    matches!(r, [b'*', h, l, b'\r', b'\n'] if h.is_ascii_hexdigit() && l.is_ascii_hexdigit())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest proper prefix of [`ANCHOR`] ending `buf`.
fn partial_anchor_len(buf: &[u8]) -> usize {
    (1..ANCHOR.len())
        .rev()
        .find(|&n| buf.ends_with(&ANCHOR[..n]))
        .unwrap_or(0)
}

/// Length of `r` without trailing `\r` and `\n`.
fn trim_line_end(r: &[u8]) -> usize {
    r.iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1)
}
