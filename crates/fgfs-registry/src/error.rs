//! Error types for registry operations.

use thiserror::Error;

use crate::value::ValueKind;

/// Errors returned by registry and slot operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A variable with this key already exists.
    #[error("variable '{0}' is already defined")]
    DuplicateKey(String),

    /// The key is empty or whitespace only.
    #[error("variable key must not be empty")]
    EmptyKey,

    /// The value cannot be represented in the slot's declared kind.
    #[error("cannot store {value:?} in {kind} variable '{key}'")]
    NotCoercible {
        /// Slot key.
        key: String,
        /// Declared kind of the slot.
        kind: ValueKind,
        /// Textual form of the rejected value.
        value: String,
    },
}

impl RegistryError {
    /// Create a duplicate key error.
    #[must_use]
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey(key.into())
    }

    /// Create a coercion error.
    #[must_use]
    pub fn not_coercible(key: impl Into<String>, kind: ValueKind, value: impl Into<String>) -> Self {
        Self::NotCoercible {
            key: key.into(),
            kind,
            value: value.into(),
        }
    }
}

/// A specialized `Result` type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::not_coercible("ALT", ValueKind::Float, "abc");
        let text = err.to_string();
        assert!(text.contains("ALT"));
        assert!(text.contains("float"));
        assert!(text.contains("abc"));

        let err = RegistryError::duplicate_key("IAS");
        assert!(err.to_string().contains("IAS"));
    }
}
