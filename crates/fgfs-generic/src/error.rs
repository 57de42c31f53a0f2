//! Error types for the ingestion pipeline.
//!
//! Only [`DescriptorError`] and [`SupervisorError::ShutdownTimeout`] are fatal.
//! Everything raised per field or per frame is counted and logged by the
//! receive loop and never interrupts the stream.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::supervisor::LifecycleState;

/// Expected root element of a generic-protocol descriptor.
pub const DESCRIPTOR_ROOT_TAG: &str = "PropertyList";

/// The descriptor could not be turned into a field map. Fatal to startup.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor file could not be opened or read.
    #[error("cannot read descriptor {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document is not well-formed XML.
    #[error("malformed descriptor XML at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the parser.
        position: u64,
        /// Parser message.
        message: String,
    },

    /// The document has no root element.
    #[error("descriptor has no root element")]
    Empty,

    /// The root element is not [`DESCRIPTOR_ROOT_TAG`].
    #[error("root tag is {found:?}, expected {DESCRIPTOR_ROOT_TAG:?}")]
    UnexpectedRoot {
        /// Tag actually found.
        found: String,
    },

    /// A required section is absent.
    #[error("descriptor has no <{0}> section")]
    MissingSection(&'static str),

    /// `var_separator` cannot be used with newline-terminated frames.
    #[error("unusable var_separator {0:?}: must be a single character other than newline")]
    InvalidSeparator(String),
}

impl DescriptorError {
    /// Create an I/O error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an XML error.
    #[must_use]
    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }
}

/// A conversion block in the descriptor could not be resolved.
///
/// Field-local: the field is kept and flagged defective.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionDefinitionError {
    /// No conversion is registered under this name.
    #[error("{0:?} is not a valid conversion function")]
    UnknownFunction(String),

    /// The `value` attribute is not a finite number.
    #[error("conversion {function:?} has non-numeric value {value:?}")]
    InvalidParameter {
        /// Function name as written.
        function: String,
        /// Parameter text as written.
        value: String,
    },

    /// The conversion element carries no `function` attribute.
    #[error("conversion has no function attribute")]
    MissingFunction,
}

/// A raw value could not be converted. Frame-local: that field is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The raw text is not a finite number.
    #[error("{raw:?} is not numeric")]
    NotNumeric {
        /// The rejected text.
        raw: String,
    },
}

impl ConversionError {
    /// Create a not-numeric error.
    #[must_use]
    pub fn not_numeric(raw: impl Into<String>) -> Self {
        Self::NotNumeric { raw: raw.into() }
    }
}

/// A descriptor key has no variable in the registry. Informational.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key} found in protocol file but not in the registry (position {position})")]
pub struct BindingWarning {
    /// Field position in the frame.
    pub position: usize,
    /// Registry key that failed to resolve.
    pub key: String,
}

/// The UDP endpoint or its worker could not be set up.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// `host:port` does not resolve to a socket address.
    #[error("cannot resolve listen address {0:?}")]
    Resolve(String),

    /// Socket creation, option setup or bind failed.
    #[error("cannot bind UDP socket on {addr}: {source}")]
    Bind {
        /// Address that was bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The receive worker thread could not be spawned.
    #[error("cannot spawn receive worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Configuration is unreadable or inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid YAML for this schema.
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

/// Lifecycle failures reported by the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Loading the descriptor failed; the supervisor is `Failed`.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The listener could not start; the supervisor stays `Bound`.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Operation attempted.
        operation: &'static str,
        /// State at the time.
        state: LifecycleState,
    },

    /// The receive worker did not exit within the shutdown deadline.
    #[error("receive worker did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

impl SupervisorError {
    /// Whether the error leaves the supervisor in its terminal `Failed` state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Descriptor(_) | Self::ShutdownTimeout(_))
    }
}

/// A specialized `Result` type for supervisor operations.
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;
