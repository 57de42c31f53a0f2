//! Prelude for fgfs-generic.
//!
//! ```rust
//! use fgfs_generic::prelude::*;
//!
//! let fields = FieldMap::parse_str(
//!     "<PropertyList><generic><output><chunk><name>ALT</name></chunk></output></generic></PropertyList>",
//! )?;
//! assert_eq!(fields.len(), 1);
//! # Ok::<(), DescriptorError>(())
//! ```

pub use crate::binder::{BindReport, Binding, BoundFields, VariableBinder};
pub use crate::config::{BridgeConfig, BridgeConfigBuilder, VariableSeed};
pub use crate::conversion::Conversion;
pub use crate::counters::{CounterSnapshot, IngestCounters};
pub use crate::decoder::{FrameDecoder, FrameOutcome};
pub use crate::descriptor::{FieldConversion, FieldMap, FieldSpec};
pub use crate::error::{
    BindingWarning, ConfigError, ConversionDefinitionError, ConversionError, DescriptorError,
    ListenerError, SupervisorError, SupervisorResult,
};
pub use crate::framing::{FrameAssembler, FrameEvent};
pub use crate::listener::{ListenerHandle, ListenerSettings, StreamListener};
pub use crate::status::{MessageCounts, StatusSnapshot};
pub use crate::supervisor::{LifecycleState, Supervisor};
