//! The registry contract consumed by the ingestion pipeline.

use core::fmt;
use std::sync::Arc;

use crate::error::RegistryResult;
use crate::value::{Value, ValueKind};

/// A single registry-owned value cell.
///
/// Implementations must make [`Slot::get`] and [`Slot::set`] safe to call
/// concurrently; a read racing a write returns either the old or the new
/// value, never a mix of both.
pub trait Slot: Send + Sync + fmt::Debug {
    /// Registry key of this slot.
    fn key(&self) -> &str;

    /// Declared kind of the slot.
    fn kind(&self) -> ValueKind;

    /// Current value.
    fn get(&self) -> Value;

    /// Replace the current value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistryError::NotCoercible`] when `value` cannot be
    /// represented in the slot's kind. The previous value is kept.
    fn set(&self, value: Value) -> RegistryResult<()>;
}

/// Lookup side of a variable registry.
///
/// The registry exclusively owns slot storage; callers hold handles only as
/// long as they need them.
pub trait VariableRegistry: Send + Sync {
    /// Resolve `key` to its slot, or `None` when the registry has no such
    /// variable.
    fn get(&self, key: &str) -> Option<Arc<dyn Slot>>;
}

impl<R: VariableRegistry + ?Sized> VariableRegistry for Arc<R> {
    fn get(&self, key: &str) -> Option<Arc<dyn Slot>> {
        (**self).get(key)
    }
}
