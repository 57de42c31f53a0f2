//! In-memory registry backed by `parking_lot` locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{RegistryError, RegistryResult};
use crate::slot::{Slot, VariableRegistry};
use crate::value::{Value, ValueKind};

/// A slot owned by a [`MemoryRegistry`].
#[derive(Debug)]
pub struct MemorySlot {
    key: String,
    kind: ValueKind,
    value: RwLock<Value>,
    writes: AtomicU64,
}

impl MemorySlot {
    fn new(key: String, kind: ValueKind) -> Self {
        Self {
            key,
            kind,
            value: RwLock::new(kind.zero()),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of successful writes since the slot was defined.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Slot for MemorySlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn get(&self) -> Value {
        self.value.read().clone()
    }

    fn set(&self, value: Value) -> RegistryResult<()> {
        let coerced = value
            .coerce(self.kind)
            .ok_or_else(|| RegistryError::not_coercible(&self.key, self.kind, value.to_string()))?;
        *self.value.write() = coerced;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Thread-safe in-memory variable registry.
///
/// Variables are defined up front with [`MemoryRegistry::define`]; the set
/// of keys is expected to stay fixed while a pipeline is bound to it.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    slots: RwLock<HashMap<String, Arc<MemorySlot>>>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new variable initialised to the zero value of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyKey`] for a blank key and
    /// [`RegistryError::DuplicateKey`] if the key already exists.
    pub fn define(&self, key: impl Into<String>, kind: ValueKind) -> RegistryResult<Arc<MemorySlot>> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(RegistryError::EmptyKey);
        }

        let mut slots = self.slots.write();
        if slots.contains_key(&key) {
            return Err(RegistryError::duplicate_key(key));
        }
        let slot = Arc::new(MemorySlot::new(key.clone(), kind));
        slots.insert(key, Arc::clone(&slot));
        Ok(slot)
    }

    /// Typed handle to a slot, for callers that need [`MemorySlot`] extras.
    #[must_use]
    pub fn slot(&self, key: &str) -> Option<Arc<MemorySlot>> {
        self.slots.read().get(key).cloned()
    }

    /// Current value of `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.slots.read().get(key).map(|slot| slot.get())
    }

    /// All keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of defined variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether no variables are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Copy of every variable's current value, ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.slots
            .read()
            .iter()
            .map(|(key, slot)| (key.clone(), slot.get()))
            .collect()
    }
}

impl VariableRegistry for MemoryRegistry {
    fn get(&self, key: &str) -> Option<Arc<dyn Slot>> {
        self.slots
            .read()
            .get(key)
            .map(|slot| Arc::clone(slot) as Arc<dyn Slot>)
    }
}
