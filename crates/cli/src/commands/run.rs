//! Collector daemon.

use std::sync::Arc;

use anyhow::Result;
use basis_collector::CollectionOrchestrator;
use basis_core::AppConfig;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{open_store, StoreArgs};
use crate::scheduler::CollectionScheduler;

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Skip the startup backfill regardless of configuration
    #[arg(long, default_value = "false")]
    pub no_backfill: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Runs the scheduled flows until Ctrl+C.
///
/// # Errors
/// Returns an error if the store, the exchange client or the scheduler
/// cannot be started.
pub async fn run_daemon(mut config: AppConfig, args: RunArgs) -> Result<()> {
    if args.no_backfill {
        config.collection.run_backfill_on_startup = false;
    }

    let store = open_store(&config, &args.store, true).await?;
    let orchestrator = Arc::new(CollectionOrchestrator::from_config(&config, store)?);
    let cancel = CancellationToken::new();

    let scheduler =
        CollectionScheduler::new(orchestrator, config.collection.clone(), cancel.clone());
    let mut jobs = scheduler.start().await?;

    info!("Collector running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    cancel.cancel();
    jobs.shutdown().await?;
    Ok(())
}
