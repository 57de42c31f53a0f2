//! Resolving descriptor keys against a variable registry.

use std::sync::{Arc, Weak};

use fgfs_registry::{Slot, VariableRegistry};
use tracing::warn;

use crate::descriptor::FieldMap;
use crate::error::BindingWarning;

/// Per-field association with registry storage.
///
/// The binding never owns the slot; a slot dropped by its registry behaves
/// like an unbound field.
#[derive(Debug, Clone, Default)]
pub enum Binding {
    /// Writes go to this slot.
    Bound(Weak<dyn Slot>),
    /// Values for this position are discarded.
    #[default]
    Unbound,
}

impl Binding {
    /// Bind to `slot` without taking ownership.
    #[must_use]
    pub fn bound(slot: &Arc<dyn Slot>) -> Self {
        Binding::Bound(Arc::downgrade(slot))
    }

    /// Upgrade to the live slot, if still bound and alive.
    #[must_use]
    pub fn slot(&self) -> Option<Arc<dyn Slot>> {
        match self {
            Binding::Bound(slot) => slot.upgrade(),
            Binding::Unbound => None,
        }
    }

    /// Whether the field was bound at bind time.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// Bindings in frame order, one per [`FieldMap`] entry.
#[derive(Debug, Clone, Default)]
pub struct BoundFields {
    bindings: Vec<Binding>,
}

impl BoundFields {
    /// Binding at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Binding> {
        self.bindings.get(position)
    }

    /// Number of entries (equals the field map length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bound entries.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_bound()).count()
    }

    /// Number of unbound entries.
    #[must_use]
    pub fn unbound_count(&self) -> usize {
        self.len().saturating_sub(self.bound_count())
    }

    /// Iterate bindings in frame order.
    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }
}

impl FromIterator<Binding> for BoundFields {
    fn from_iter<I: IntoIterator<Item = Binding>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Outcome of a bind pass.
#[derive(Debug, Clone, Default)]
pub struct BindReport {
    /// Keys the registry did not know.
    pub warnings: Vec<BindingWarning>,
}

impl BindReport {
    /// Whether every keyed field resolved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Resolves every keyed field of a [`FieldMap`] exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableBinder;

impl VariableBinder {
    /// Bind `fields` against `registry`.
    ///
    /// Missing keys are logged and reported; the matching field stays
    /// unbound for the life of the pipeline. Nameless fields are unbound
    /// silently.
    pub fn bind<R: VariableRegistry + ?Sized>(
        fields: &FieldMap,
        registry: &R,
    ) -> (BoundFields, BindReport) {
        let mut report = BindReport::default();

        let bound = fields
            .iter()
            .map(|field| {
                let Some(key) = field.key.as_deref() else {
                    return Binding::Unbound;
                };
                match registry.get(key) {
                    Some(slot) => Binding::bound(&slot),
                    None => {
                        let warning = BindingWarning {
                            position: field.position,
                            key: key.to_string(),
                        };
                        warn!(position = field.position, key, "{warning}");
                        report.warnings.push(warning);
                        Binding::Unbound
                    }
                }
            })
            .collect();

        (bound, report)
    }
}
