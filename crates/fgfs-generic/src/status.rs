//! Status reporting.

use serde::Serialize;

use crate::binder::BoundFields;
use crate::counters::CounterSnapshot;
use crate::descriptor::FieldMap;
use crate::supervisor::LifecycleState;

/// Frame traffic in each direction. The ingester never sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MessageCounts {
    /// Frames received.
    pub received: u64,
    /// Frames sent; always zero.
    pub sent: u64,
}

/// Point-in-time view of an ingester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Number of descriptor fields.
    pub properties: usize,
    /// Frame counts.
    pub messages: MessageCounts,
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Fields bound to registry slots.
    pub bound: usize,
    /// Fields without a slot.
    pub unbound: usize,
    /// Fields with an unusable conversion.
    pub defective: usize,
    /// Full counter set.
    pub counters: CounterSnapshot,
}

impl StatusSnapshot {
    /// Assemble a snapshot.
    #[must_use]
    pub fn new(
        state: LifecycleState,
        fields: &FieldMap,
        bindings: &BoundFields,
        counters: CounterSnapshot,
    ) -> Self {
        Self {
            properties: fields.len(),
            messages: MessageCounts {
                received: counters.frames_received,
                sent: 0,
            },
            state,
            bound: bindings.bound_count(),
            unbound: fields.len().saturating_sub(bindings.bound_count()),
            defective: fields.defective_count(),
            counters,
        }
    }
}
