//! # fgfs-registry
//!
//! Variable registry contract consumed by the fgfs-bridge ingestion pipeline,
//! plus an in-memory implementation used by the CLI and the test suites.
//!
//! The pipeline only ever needs three operations:
//!
//! - [`VariableRegistry::get`] to resolve a key to a [`Slot`] once at startup
//! - [`Slot::set`] to publish a decoded value
//! - [`Slot::get`] to read the current value back
//!
//! ## Thread Safety
//!
//! A registry is shared between the receive worker (the only writer) and any
//! number of readers. [`MemoryRegistry`] guards every slot with its own
//! `RwLock`, so a single-slot read never observes a torn value. There is no
//! cross-slot transaction: a reader may see a frame half applied.
//!
//! ## Example
//!
//! ```rust
//! use fgfs_registry::{MemoryRegistry, Value, ValueKind, VariableRegistry};
//!
//! let registry = MemoryRegistry::new();
//! registry.define("ALT", ValueKind::Float)?;
//!
//! let slot = registry.get("ALT").ok_or("ALT should be defined")?;
//! slot.set(Value::Text("1500".to_string()))?;
//! assert_eq!(slot.get().as_f64(), Some(1500.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod memory;
pub mod slot;
pub mod value;

pub use error::{RegistryError, RegistryResult};
pub use memory::{MemoryRegistry, MemorySlot};
pub use slot::{Slot, VariableRegistry};
pub use value::{Value, ValueKind};
