//! Command implementations for fgfsctl

pub mod check;
pub mod listen;

use std::path::PathBuf;

use clap::Args;

/// Arguments shared by commands that read a bridge configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the YAML bridge configuration
    #[arg(short, long, env = "FGFSCTL_CONFIG")]
    pub config: PathBuf,
}
