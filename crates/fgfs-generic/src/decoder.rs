//! Positional frame decoding into bound registry slots.

use std::sync::Arc;

use fgfs_registry::Value;
use tracing::{debug, trace};

use crate::binder::BoundFields;
use crate::counters::IngestCounters;
use crate::descriptor::{FieldConversion, FieldMap};
use crate::framing::FrameEvent;

/// Default field separator.
pub const DEFAULT_SEPARATOR: char = ',';

/// Result of applying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    /// Values present in the frame.
    pub values: usize,
    /// Slots written.
    pub written: usize,
    /// Positions skipped because they were unbound or defective, or because
    /// the frame carried more values than the descriptor declares.
    pub skipped: usize,
    /// Values that failed conversion.
    pub conversion_errors: usize,
    /// Writes rejected by the registry.
    pub write_errors: usize,
}

/// Applies frames to the slots bound for a field map.
#[derive(Debug)]
pub struct FrameDecoder {
    fields: Arc<FieldMap>,
    bindings: BoundFields,
    separator: char,
    counters: Arc<IngestCounters>,
}

impl FrameDecoder {
    /// Create a decoder.
    ///
    /// `bindings` must come from binding `fields`, so both have one entry
    /// per position.
    #[must_use]
    pub fn new(
        fields: Arc<FieldMap>,
        bindings: BoundFields,
        separator: char,
        counters: Arc<IngestCounters>,
    ) -> Self {
        Self {
            fields,
            bindings,
            separator,
            counters,
        }
    }

    /// Separator used to split frames.
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Counters this decoder updates.
    #[must_use]
    pub fn counters(&self) -> &Arc<IngestCounters> {
        &self.counters
    }

    /// Handle one assembler event, updating counters.
    ///
    /// Every event is one terminator, so every event counts as a received
    /// frame; oversized and malformed frames are also counted separately.
    ///
    /// Returns the frame outcome, or `None` for a frame that was oversized
    /// or not valid UTF-8.
    pub fn dispatch(&self, event: FrameEvent<'_>) -> Option<FrameOutcome> {
        match event {
            FrameEvent::Oversized => {
                self.counters.inc_oversized_frame();
                self.counters.inc_frame();
                debug!("discarded oversized frame");
                None
            }
            FrameEvent::Frame(bytes) => {
                // Counted after the writes so an observer that sees the
                // count also sees the values.
                let outcome = match std::str::from_utf8(bytes) {
                    Ok(text) => Some(self.apply(text)),
                    Err(err) => {
                        self.counters.inc_malformed_frame();
                        debug!(error = %err, len = bytes.len(), "frame is not valid UTF-8");
                        None
                    }
                };
                self.counters.inc_frame();
                outcome
            }
        }
    }

    /// Split `frame` and write each value to its bound slot.
    ///
    /// Only positions present in both the frame and the field map are
    /// touched. Per-field failures are counted and skipped.
    pub fn apply(&self, frame: &str) -> FrameOutcome {
        let frame = frame.strip_suffix('\r').unwrap_or(frame);
        let mut outcome = FrameOutcome::default();

        let entries = self.fields.iter().zip(self.bindings.iter());
        for (raw, (field, binding)) in frame.split(self.separator).zip(entries) {
            outcome.values = outcome.values.saturating_add(1);

            let Some(slot) = binding.slot() else {
                outcome.skipped = outcome.skipped.saturating_add(1);
                continue;
            };

            let value = match &field.conversion {
                FieldConversion::None => Value::Text(raw.to_string()),
                FieldConversion::Apply(conversion) => match conversion.apply(raw) {
                    Ok(converted) => Value::Float(converted),
                    Err(err) => {
                        self.counters.inc_conversion_error();
                        outcome.conversion_errors = outcome.conversion_errors.saturating_add(1);
                        debug!(position = field.position, key = slot.key(), error = %err, "conversion failed");
                        continue;
                    }
                },
                FieldConversion::Defective(_) => {
                    outcome.skipped = outcome.skipped.saturating_add(1);
                    continue;
                }
            };

            match slot.set(value) {
                Ok(()) => {
                    self.counters.inc_field_written();
                    outcome.written = outcome.written.saturating_add(1);
                }
                Err(err) => {
                    self.counters.inc_write_error();
                    outcome.write_errors = outcome.write_errors.saturating_add(1);
                    debug!(position = field.position, error = %err, "slot write rejected");
                }
            }
        }

        let total = frame.split(self.separator).count();
        outcome.skipped = outcome
            .skipped
            .saturating_add(total.saturating_sub(outcome.values));
        outcome.values = total;

        trace!(?outcome, "frame applied");
        outcome
    }
}
