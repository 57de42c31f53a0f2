//! fgfsctl - FlightGear generic protocol bridge CLI
//!
//! Checks protocol descriptors and ingests generic-protocol UDP telemetry
//! into an in-memory variable registry.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::ConfigArgs;
use crate::commands::listen::ListenArgs;
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "fgfsctl")]
#[command(about = "FlightGear generic protocol bridge - check descriptors and ingest telemetry")]
#[command(version)]
#[command(long_about = "
fgfsctl reads a FlightGear generic-protocol descriptor (<fg_root>/Protocol/<xml_file>)
and ingests the matching newline-terminated UDP stream into a variable registry.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a configuration and print its protocol descriptor
    Check(ConfigArgs),

    /// Ingest generic-protocol frames until interrupted
    Listen(ListenArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("fgfsctl={log_level},fgfs_generic={log_level},fgfs_registry={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            e.exit_code()
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Check(args) => commands::check::execute(args, cli.json),
        Commands::Listen(args) => commands::listen::execute(args, cli.json).await,
    }
}
