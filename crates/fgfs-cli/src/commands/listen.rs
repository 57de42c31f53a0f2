//! `fgfsctl listen`: ingest generic-protocol frames into an in-memory registry

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use fgfs_generic::{BridgeConfig, FieldMap, Supervisor};
use fgfs_registry::{MemoryRegistry, ValueKind};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::ConfigArgs;
use crate::error::CliError;
use crate::output;

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print a status line every N milliseconds (0 disables)
    #[arg(long, default_value_t = 1000)]
    pub status_interval_ms: u64,

    /// Stop after N milliseconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_ms: Option<u64>,
}

/// Define the configured variables, or one float per descriptor key when
/// none are configured.
fn seed_registry(config: &BridgeConfig) -> Result<MemoryRegistry, CliError> {
    let registry = MemoryRegistry::new();

    if config.variables.is_empty() {
        let fields = FieldMap::load(config.descriptor_path())?;
        for key in fields.keys() {
            if registry.slot(key).is_none() {
                registry.define(key, ValueKind::Float)?;
            }
        }
    } else {
        for seed in &config.variables {
            registry.define(seed.key.as_str(), seed.kind)?;
        }
    }

    debug!(variables = registry.len(), "registry seeded");
    Ok(registry)
}

pub async fn execute(args: &ListenArgs, json: bool) -> Result<(), CliError> {
    let config = BridgeConfig::load(&args.config.config)?;
    let registry = Arc::new(seed_registry(&config)?);

    let mut supervisor = Supervisor::new(config, registry.clone());
    supervisor.run()?;
    if let Some(addr) = supervisor.local_addr() {
        info!(%addr, "fgfsctl listening");
    }

    let interval = Duration::from_millis(args.status_interval_ms);
    let mut ticker = time::interval(if interval.is_zero() {
        Duration::from_secs(3600)
    } else {
        interval
    });
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    let deadline = args.duration_ms.map(Duration::from_millis);
    let stop_after = async {
        match deadline {
            Some(duration) => time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop_after);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("interrupt received, stopping");
                break;
            }
            () = &mut stop_after => {
                debug!("listen duration elapsed");
                break;
            }
            _ = ticker.tick(), if !interval.is_zero() => {
                output::print_status(&supervisor.status(), json);
            }
        }
    }

    // Stopping waits on the worker thread; keep it off the async executor.
    let supervisor = tokio::task::spawn_blocking(move || {
        let result = supervisor.stop();
        (supervisor, result)
    })
    .await?;
    let (supervisor, result) = supervisor;
    result?;

    output::print_final(&supervisor.status(), &registry.snapshot(), json);
    Ok(())
}
