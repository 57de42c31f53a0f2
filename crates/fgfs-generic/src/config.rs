//! Bridge configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fgfs_registry::ValueKind;
use serde::{Deserialize, Serialize};

use crate::decoder::DEFAULT_SEPARATOR;
use crate::error::ConfigError;
use crate::framing::DEFAULT_MAX_FRAME_LEN;
use crate::listener::ListenerSettings;

/// Directory below `fg_root` that holds protocol descriptors.
pub const PROTOCOL_DIR: &str = "Protocol";

/// A registry variable to define before binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSeed {
    /// Registry key.
    pub key: String,
    /// Declared kind.
    #[serde(default)]
    pub kind: ValueKind,
}

/// Settings for one generic-protocol ingester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Address to bind.
    pub host: String,
    /// UDP port FlightGear sends to.
    pub port: u16,
    /// FlightGear data directory.
    pub fg_root: PathBuf,
    /// Descriptor file name inside `<fg_root>/Protocol`.
    pub xml_file: String,
    /// Field separator, unless the descriptor declares `var_separator`.
    pub separator: char,
    /// Socket read timeout (milliseconds).
    pub receive_timeout_ms: u64,
    /// How long `stop` waits for the worker (milliseconds).
    pub shutdown_timeout_ms: u64,
    /// Bytes per `recv`.
    pub recv_buffer_size: usize,
    /// Longest accepted frame in bytes.
    pub max_frame_len: usize,
    /// Variables to define in a fresh registry.
    pub variables: Vec<VariableSeed>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5500,
            fg_root: PathBuf::from("."),
            xml_file: String::new(),
            separator: DEFAULT_SEPARATOR,
            receive_timeout_ms: 2000,
            shutdown_timeout_ms: 2000,
            recv_buffer_size: 1024,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            variables: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid YAML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    ///
    /// # Errors
    ///
    /// See [`BridgeConfig::from_yaml`]; also returns [`ConfigError::Io`] if
    /// the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.xml_file.trim().is_empty() {
            return Err(ConfigError::invalid("xml_file must be set"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host must be set"));
        }
        if self.separator == '\n' || self.separator == '\r' {
            return Err(ConfigError::invalid(
                "separator cannot be a line terminator",
            ));
        }
        if self.receive_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "receive_timeout_ms must be greater than 0",
            ));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "shutdown_timeout_ms must be greater than 0",
            ));
        }
        if self.shutdown_timeout_ms < self.receive_timeout_ms {
            return Err(ConfigError::invalid(
                "shutdown_timeout_ms cannot be shorter than receive_timeout_ms",
            ));
        }
        if self.recv_buffer_size == 0 {
            return Err(ConfigError::invalid(
                "recv_buffer_size must be greater than 0",
            ));
        }
        if self.max_frame_len == 0 {
            return Err(ConfigError::invalid("max_frame_len must be greater than 0"));
        }
        if let Some(seed) = self.variables.iter().find(|seed| seed.key.trim().is_empty()) {
            return Err(ConfigError::invalid(format!(
                "variable key cannot be blank (kind {})",
                seed.kind
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// `<fg_root>/Protocol/<xml_file>`.
    #[must_use]
    pub fn descriptor_path(&self) -> PathBuf {
        self.fg_root.join(PROTOCOL_DIR).join(&self.xml_file)
    }

    /// Socket read timeout.
    #[must_use]
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Deadline for worker shutdown.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Listener parameters derived from this configuration.
    #[must_use]
    pub fn listener_settings(&self) -> ListenerSettings {
        ListenerSettings {
            host: self.host.clone(),
            port: self.port,
            receive_timeout: self.receive_timeout(),
            recv_buffer_size: self.recv_buffer_size,
            max_frame_len: self.max_frame_len,
        }
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Set the bind host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the UDP port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the FlightGear root.
    #[must_use]
    pub fn fg_root(mut self, fg_root: impl Into<PathBuf>) -> Self {
        self.config.fg_root = fg_root.into();
        self
    }

    /// Set the descriptor file name.
    #[must_use]
    pub fn xml_file(mut self, xml_file: impl Into<String>) -> Self {
        self.config.xml_file = xml_file.into();
        self
    }

    /// Set the default separator.
    #[must_use]
    pub fn separator(mut self, separator: char) -> Self {
        self.config.separator = separator;
        self
    }

    /// Set the socket read timeout in milliseconds.
    #[must_use]
    pub fn receive_timeout_ms(mut self, ms: u64) -> Self {
        self.config.receive_timeout_ms = ms;
        self
    }

    /// Set the shutdown deadline in milliseconds.
    #[must_use]
    pub fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_timeout_ms = ms;
        self
    }

    /// Set the per-read buffer size.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Set the frame length limit.
    #[must_use]
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.max_frame_len = len;
        self
    }

    /// Add a registry seed variable.
    #[must_use]
    pub fn variable(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.config.variables.push(VariableSeed {
            key: key.into(),
            kind,
        });
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<BridgeConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
