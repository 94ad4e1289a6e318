//! CLI commands for basis capture.

pub mod backfill;
pub mod collect;
pub mod migrate;
pub mod query;
pub mod resolve;
pub mod run;
pub mod spread;

pub use backfill::{run_backfill, BackfillArgs};
pub use collect::{run_collect, CollectArgs};
pub use migrate::{run_migrate, MigrateArgs};
pub use query::{run_differences, run_prices, DifferencesArgs, PricesArgs};
pub use resolve::{run_resolve, ResolveArgs};
pub use run::{run_daemon, RunArgs};
pub use spread::{run_spread, SpreadArgs};

use std::sync::Arc;

use anyhow::{anyhow, Result};
use basis_core::{AppConfig, ConfigLoader, TimeRange};
use basis_data::{MemoryPriceStore, PgPriceStore, PriceStore};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;

/// Storage selection shared by commands that write.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Database connection URL (overrides database.url)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// Keep results in memory instead of writing to the database
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

/// Loads configuration, applying an optional profile overlay.
///
/// # Errors
/// Returns an error if the configuration cannot be parsed or is invalid.
pub fn load_config(path: &str, profile: Option<&str>) -> Result<AppConfig> {
    let config = match profile {
        Some(profile) => ConfigLoader::load_with_profile(path, profile)?,
        None => ConfigLoader::load(path)?,
    };
    tracing::debug!(path, ?profile, "Loaded configuration");
    Ok(config)
}

/// Opens the configured store, or an in-memory one for dry runs.
///
/// # Errors
/// Returns an error if the database connection or migrations fail.
pub async fn open_store(
    config: &AppConfig,
    args: &StoreArgs,
    migrate: bool,
) -> Result<Arc<dyn PriceStore>> {
    if args.dry_run {
        tracing::warn!("Dry run: results are kept in memory and discarded on exit");
        return Ok(Arc::new(MemoryPriceStore::new()));
    }

    let store = connect(config, args.db_url.as_deref()).await?;
    if migrate {
        store.migrate().await?;
    }
    Ok(Arc::new(store))
}

/// Connects to Postgres, preferring an explicit URL over the config value.
///
/// # Errors
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &AppConfig, db_url: Option<&str>) -> Result<PgPriceStore> {
    let mut database = config.database.clone();
    if let Some(url) = db_url {
        database.url = url.to_string();
    }
    let store = PgPriceStore::connect(&database).await?;
    tracing::info!("Connected to database");
    Ok(store)
}

/// Parses an ISO 8601 timestamp argument.
///
/// # Errors
/// Returns an error naming the argument if it does not parse.
pub fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>> {
    value.parse().map_err(|_| {
        anyhow!("Invalid {name} time. Use ISO 8601 format (e.g., 2025-03-01T00:00:00Z)")
    })
}

/// Builds a range from optional bounds; missing `end` is now, missing
/// `start` is `end - lookback`.
///
/// # Errors
/// Returns an error if a bound does not parse or `start >= end`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    lookback: Duration,
    now: DateTime<Utc>,
) -> Result<TimeRange> {
    let end = end.map(|v| parse_timestamp("end", v)).transpose()?.unwrap_or(now);
    let start = start
        .map(|v| parse_timestamp("start", v))
        .transpose()?
        .unwrap_or(end - lookback);

    if start >= end {
        return Err(anyhow!("Start time must be before end time"));
    }
    Ok(TimeRange::new(start, end))
}

/// Writes a value to stdout as pretty JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_range_defaults_to_lookback_from_now() {
        let range = resolve_range(None, None, Duration::hours(24), now()).unwrap();
        assert_eq!(range.end, now());
        assert_eq!(range.start, now() - Duration::hours(24));
    }

    #[test]
    fn test_range_explicit_bounds() {
        let range = resolve_range(
            Some("2025-03-01T00:00:00Z"),
            Some("2025-03-08T00:00:00Z"),
            Duration::hours(1),
            now(),
        )
        .unwrap();
        assert_eq!(range.duration(), Duration::days(7));
    }

    #[test]
    fn test_range_start_only_ends_now() {
        let range = resolve_range(Some("2025-03-29T12:00:00Z"), None, Duration::hours(1), now())
            .unwrap();
        assert_eq!(range.duration(), Duration::days(1));
    }

    #[test]
    fn test_range_rejects_inverted() {
        let err = resolve_range(
            Some("2025-03-08T00:00:00Z"),
            Some("2025-03-01T00:00:00Z"),
            Duration::hours(1),
            now(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("before"));
    }

    #[test]
    fn test_range_rejects_garbage() {
        let err = resolve_range(Some("last tuesday"), None, Duration::hours(1), now()).unwrap_err();
        assert!(err.to_string().contains("start"));
    }

    #[tokio::test]
    async fn test_dry_run_store_is_memory() {
        let args = StoreArgs {
            db_url: None,
            dry_run: true,
        };
        let store = open_store(&AppConfig::default(), &args, true).await.unwrap();
        assert!(store.all_samples(10).await.unwrap().is_empty());
    }
}
