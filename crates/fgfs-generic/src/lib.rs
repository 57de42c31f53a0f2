//! # fgfs-generic
//!
//! Ingests FlightGear "generic protocol" telemetry over UDP and writes each
//! field into a variable registry.
//!
//! FlightGear emits one newline-terminated text record per simulation step,
//! its fields separated by a single character and laid out as described by a
//! protocol XML file under `<fg_root>/Protocol`. This crate:
//!
//! - [`descriptor`] loads that XML into an ordered [`FieldMap`]
//! - [`conversion`] resolves per-field unit conversions
//! - [`binder`] resolves field keys against a [`fgfs_registry::VariableRegistry`]
//! - [`framing`] and [`decoder`] turn datagrams into slot writes
//! - [`listener`] owns the socket and the receive worker
//! - [`supervisor`] drives the lifecycle and reports [`StatusSnapshot`]s
//!
//! Per-field and per-frame problems are counted and logged, never fatal.
//! Only a bad descriptor or a worker that will not stop is.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fgfs_generic::prelude::*;
//! use fgfs_registry::{MemoryRegistry, ValueKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(MemoryRegistry::new());
//! registry.define("ALT", ValueKind::Float)?;
//!
//! let config = BridgeConfig::builder()
//!     .fg_root("/usr/share/flightgear")
//!     .xml_file("fix.xml")
//!     .build()?;
//! let mut supervisor = Supervisor::new(config, registry.clone());
//! supervisor.run()?;
//! // ...
//! supervisor.stop()?;
//! println!("{:?}", supervisor.status());
//! # Ok(())
//! # }
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod binder;
pub mod config;
pub mod conversion;
pub mod counters;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod framing;
pub mod listener;
pub mod status;
pub mod supervisor;

pub mod prelude;

pub use binder::{BindReport, Binding, BoundFields, VariableBinder};
pub use config::{BridgeConfig, BridgeConfigBuilder, VariableSeed};
pub use conversion::Conversion;
pub use counters::{CounterSnapshot, IngestCounters};
pub use decoder::{DEFAULT_SEPARATOR, FrameDecoder, FrameOutcome};
pub use descriptor::{FieldConversion, FieldMap, FieldSpec};
pub use error::{
    BindingWarning, ConfigError, ConversionDefinitionError, ConversionError, DescriptorError,
    ListenerError, SupervisorError, SupervisorResult,
};
pub use framing::{FrameAssembler, FrameEvent};
pub use listener::{ListenerHandle, ListenerSettings, StreamListener};
pub use status::{MessageCounts, StatusSnapshot};
pub use supervisor::{LifecycleState, Supervisor};
