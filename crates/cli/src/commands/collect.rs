//! One-shot live collection.

use anyhow::Result;
use basis_collector::CollectionOrchestrator;
use basis_core::AppConfig;
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::{open_store, print_json, StoreArgs};

/// Arguments for the collect command.
#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Runs the live flow once and prints its report.
///
/// # Errors
/// Returns an error if the store cannot be opened or the flow fails.
pub async fn run_collect(config: AppConfig, args: CollectArgs) -> Result<()> {
    let store = open_store(&config, &args.store, false).await?;
    let orchestrator = CollectionOrchestrator::from_config(&config, store)?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, flushing collected samples");
            ctrl_c_cancel.cancel();
        }
    });

    let report = orchestrator.run_live(&cancel).await;
    watcher.abort();

    print_json(&report?)
}
