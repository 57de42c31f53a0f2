//! Ingestion counters.
//!
//! Written only by the receive worker, read from any thread through
//! [`IngestCounters::snapshot`]. Counters are independent and use
//! `Ordering::Relaxed`, except `frames_received`, which is released after a
//! frame's writes and acquired by [`IngestCounters::frames_received`].

use core::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time copy of [`IngestCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    /// Newline-terminated frames received, malformed and oversized ones
    /// included.
    pub frames_received: u64,
    /// Datagrams read from the socket.
    pub datagrams_received: u64,
    /// Payload bytes read from the socket.
    pub bytes_received: u64,
    /// Transport errors other than timeouts.
    pub receive_errors: u64,
    /// Frames that were not valid UTF-8. Also counted in `frames_received`.
    pub malformed_frames: u64,
    /// Frames discarded for exceeding the frame length limit. Also counted
    /// in `frames_received`.
    pub oversized_frames: u64,
    /// Successful slot writes.
    pub fields_written: u64,
    /// Field values that failed conversion.
    pub conversion_errors: u64,
    /// Slot writes rejected by the registry.
    pub write_errors: u64,
}

/// Lock-free counters shared between the worker and observers.
#[derive(Debug, Default)]
pub struct IngestCounters {
    frames_received: AtomicU64,
    datagrams_received: AtomicU64,
    bytes_received: AtomicU64,
    receive_errors: AtomicU64,
    malformed_frames: AtomicU64,
    oversized_frames: AtomicU64,
    fields_written: AtomicU64,
    conversion_errors: AtomicU64,
    write_errors: AtomicU64,
}

impl IngestCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed frame.
    #[inline]
    pub fn inc_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Release);
    }

    /// Count one datagram of `len` bytes.
    #[inline]
    pub fn record_datagram(&self, len: usize) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(u64::try_from(len).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Count one transport error.
    #[inline]
    pub fn inc_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one frame that was not valid UTF-8.
    #[inline]
    pub fn inc_malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one discarded oversized frame.
    #[inline]
    pub fn inc_oversized_frame(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one successful slot write.
    #[inline]
    pub fn inc_field_written(&self) {
        self.fields_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one conversion failure.
    #[inline]
    pub fn inc_conversion_error(&self) {
        self.conversion_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one rejected slot write.
    #[inline]
    pub fn inc_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames received so far.
    #[inline]
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Acquire)
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            frames_received: self.frames_received.load(Ordering::Acquire),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            fields_written: self.fields_written.load(Ordering::Relaxed),
            conversion_errors: self.conversion_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}
