//! Error types for fgfsctl

use std::process::ExitCode;

use fgfs_generic::{ConfigError, DescriptorError, SupervisorError};
use fgfs_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        let code: u8 = match self {
            CliError::Descriptor(_) | CliError::Supervisor(SupervisorError::Descriptor(_)) => 2,
            CliError::Config(_) => 3,
            CliError::Supervisor(SupervisorError::Listener(_)) => 4,
            CliError::Supervisor(SupervisorError::ShutdownTimeout(_)) => 5,
            _ => 1,
        };
        ExitCode::from(code)
    }
}
