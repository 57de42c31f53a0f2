//! Newline framing over a datagram stream.
//!
//! FlightGear sends one record per line, but the transport gives no frame
//! boundaries: a record may be split across datagrams and one datagram may
//! hold several records. [`FrameAssembler`] buffers bytes until a terminator
//! arrives.

/// Frame terminator.
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Default upper bound for a single frame, terminator excluded.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Something the assembler produced while consuming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent<'a> {
    /// A complete frame, terminator stripped.
    Frame(&'a [u8]),
    /// A frame exceeded the length limit and was discarded up to its
    /// terminator.
    Oversized,
}

/// Byte-level frame assembler.
///
/// Buffer growth is bounded by `max_frame_len`; once a partial frame goes
/// over the limit the rest of it is dropped without buffering.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    max_frame_len: usize,
    discarding: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameAssembler {
    /// Create an assembler with the given frame length limit.
    #[must_use]
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_frame_len.min(4096)),
            max_frame_len,
            discarding: false,
        }
    }

    /// Consume `bytes`, calling `on_event` once per terminator seen.
    ///
    /// Bytes after the last terminator stay buffered for the next call.
    pub fn push(&mut self, bytes: &[u8], mut on_event: impl FnMut(FrameEvent<'_>)) {
        let mut rest = bytes;
        while let Some(idx) = rest.iter().position(|&b| b == FRAME_TERMINATOR) {
            let (head, tail) = rest.split_at(idx);
            self.buffer(head);

            if self.discarding {
                self.discarding = false;
                on_event(FrameEvent::Oversized);
            } else {
                on_event(FrameEvent::Frame(&self.buf));
            }
            self.buf.clear();

            rest = tail.get(1..).unwrap_or_default();
        }
        self.buffer(rest);
    }

    /// Bytes of the incomplete frame currently held.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    fn buffer(&mut self, bytes: &[u8]) {
        if self.discarding || bytes.is_empty() {
            return;
        }
        if self.buf.len().saturating_add(bytes.len()) > self.max_frame_len {
            self.buf.clear();
            self.discarding = true;
            return;
        }
        self.buf.extend_from_slice(bytes);
    }
}
