//! Spread recomputation command.

use anyhow::{Context, Result};
use basis_collector::SpreadCalculator;
use basis_core::AppConfig;
use chrono::Utc;
use clap::Args;
use serde_json::json;

use super::{open_store, print_json, resolve_range, StoreArgs};

/// Arguments for the spread command.
#[derive(Args, Debug, Clone)]
pub struct SpreadArgs {
    /// Start timestamp (ISO 8601)
    #[arg(long)]
    pub start: Option<String>,

    /// End timestamp (ISO 8601); defaults to now
    #[arg(long)]
    pub end: Option<String>,

    /// Hours before the end when --start is omitted
    /// (defaults to collection.live_spread_lookback_hours)
    #[arg(long, conflicts_with = "start")]
    pub hours: Option<i64>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Recomputes spreads for a range from stored samples.
///
/// # Errors
/// Returns an error if the range is invalid or storage fails.
pub async fn run_spread(mut config: AppConfig, args: SpreadArgs) -> Result<()> {
    if let Some(hours) = args.hours {
        config.collection.live_spread_lookback_hours = hours;
        config.validate().context("Invalid --hours")?;
    }
    let range = resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        config.collection.spread_lookback()?,
        Utc::now(),
    )?;

    let store = open_store(&config, &args.store, false).await?;
    let calculator = SpreadCalculator::new(
        store,
        config.collection.spread_first,
        config.collection.spread_second,
    );
    let saved = calculator.compute_differences(range).await?;

    print_json(&json!({
        "start": range.start,
        "end": range.end,
        "first": config.collection.spread_first,
        "second": config.collection.spread_second,
        "differences_written": saved,
    }))
}
