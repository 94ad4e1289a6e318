//! Read-only queries over stored samples and spreads.

use anyhow::Result;
use basis_core::{AppConfig, ContractTier};
use basis_data::{PriceStore, DEFAULT_MAX_ITEMS};
use clap::Args;

use super::{connect, parse_timestamp, print_json};

/// Arguments for the prices command.
#[derive(Args, Debug, Clone)]
pub struct PricesArgs {
    /// Only this tier (code, snake or kebab name)
    #[arg(long)]
    pub tier: Option<ContractTier>,

    /// Maximum rows, newest first
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Period start (ISO 8601); with --end returns the whole period, oldest first
    #[arg(long, requires = "end", conflicts_with = "tier")]
    pub start: Option<String>,

    /// Period end (ISO 8601)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Database connection URL (overrides database.url)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Arguments for the differences command.
#[derive(Args, Debug, Clone)]
pub struct DifferencesArgs {
    /// Only spreads with this tier on either leg
    #[arg(long)]
    pub tier: Option<ContractTier>,

    /// Maximum rows, newest first
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Period start (ISO 8601), matched on the second leg
    #[arg(long, requires = "end", conflicts_with = "tier")]
    pub start: Option<String>,

    /// Period end (ISO 8601)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Database connection URL (overrides database.url)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Prints stored samples.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn run_prices(config: AppConfig, args: PricesArgs) -> Result<()> {
    let store = connect(&config, args.db_url.as_deref()).await?;

    let samples = match (args.start.as_deref(), args.end.as_deref(), args.tier) {
        (Some(start), Some(end), _) => {
            store
                .samples_in_period(parse_timestamp("start", start)?, parse_timestamp("end", end)?)
                .await?
        }
        (_, _, Some(tier)) => store.samples_by_tier(tier, args.max_items).await?,
        _ => store.all_samples(args.max_items).await?,
    };

    print_json(&samples)
}

/// Prints stored spreads.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn run_differences(config: AppConfig, args: DifferencesArgs) -> Result<()> {
    let store = connect(&config, args.db_url.as_deref()).await?;

    let differences = match (args.start.as_deref(), args.end.as_deref(), args.tier) {
        (Some(start), Some(end), _) => {
            store
                .differences_in_period(
                    parse_timestamp("start", start)?,
                    parse_timestamp("end", end)?,
                )
                .await?
        }
        (_, _, Some(tier)) => store.differences_by_tier(tier, args.max_items).await?,
        _ => store.all_differences(args.max_items).await?,
    };

    print_json(&differences)
}
