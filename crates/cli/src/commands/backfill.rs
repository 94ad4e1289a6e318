//! Historical backfill command.
//!
//! Fetches hourly continuous-contract candles for each tier, stores the
//! per-hour mean close and recomputes spreads over the same range.

use anyhow::{Context, Result};
use basis_collector::CollectionOrchestrator;
use basis_core::AppConfig;
use chrono::Utc;
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::{open_store, print_json, resolve_range, StoreArgs};

/// Arguments for the backfill command.
#[derive(Args, Debug, Clone)]
pub struct BackfillArgs {
    /// Start timestamp (ISO 8601 format, e.g., "2025-01-01T00:00:00Z")
    #[arg(long)]
    pub start: Option<String>,

    /// End timestamp (ISO 8601 format); defaults to now
    #[arg(long)]
    pub end: Option<String>,

    /// Days before the end to backfill when --start is omitted
    /// (defaults to collection.backfill_days)
    #[arg(long, conflicts_with = "start")]
    pub days: Option<i64>,

    /// Window length in days, at most 41 so one window fits a single
    /// request (defaults to collection.backfill_window_days)
    #[arg(long)]
    pub window_days: Option<i64>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Runs the backfill command.
///
/// # Errors
/// Returns an error if the range is invalid, the store cannot be opened, or
/// the spread step fails.
pub async fn run_backfill(mut config: AppConfig, args: BackfillArgs) -> Result<()> {
    apply_overrides(&mut config, &args)?;

    let range = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        config.collection.backfill_span()?,
        Utc::now(),
    )?;

    tracing::info!(
        "Backfilling {} to {} in {}-day windows",
        range.start.format("%Y-%m-%d %H:%M"),
        range.end.format("%Y-%m-%d %H:%M"),
        config.collection.backfill_window_days
    );

    let store = open_store(&config, &args.store, false).await?;
    let orchestrator = CollectionOrchestrator::from_config(&config, store)?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current window");
            ctrl_c_cancel.cancel();
        }
    });

    let report = orchestrator.run_backfill(range, &cancel).await;
    watcher.abort();

    print_json(&report?)
}

/// Applies `--days` and `--window-days` and re-validates the result.
fn apply_overrides(config: &mut AppConfig, args: &BackfillArgs) -> Result<()> {
    if let Some(days) = args.days {
        config.collection.backfill_days = days;
    }
    if let Some(window_days) = args.window_days {
        config.collection.backfill_window_days = window_days;
    }
    config
        .validate()
        .context("Invalid --days or --window-days")
}
