use crate::bucket::{checked_days, checked_hours};
use crate::tier::ContractTier;
use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Candles the exchange returns per continuous-kline request.
pub const MAX_CANDLES_PER_REQUEST: u32 = 1000;

/// Longest window whose hourly candles fit in one request (41 days, 984 hours).
pub const MAX_BACKFILL_WINDOW_DAYS: i64 = MAX_CANDLES_PER_REQUEST as i64 / 24;

/// Ten years of history.
pub const MAX_BACKFILL_DAYS: i64 = 3650;

pub const MAX_SPREAD_LOOKBACK_HOURS: i64 = MAX_BACKFILL_DAYS * 24;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub exchange: ExchangeConfig,
    pub collection: CollectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/basis".to_string(),
            max_connections: 10,
        }
    }
}

/// Exchange endpoint and the asset pair whose delivery contracts are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    pub base_asset: String,
    pub quote_asset: String,
    /// Pair name used by the continuous-contract candle endpoint.
    pub pair: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            timeout_secs: 30,
            requests_per_second: 10,
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            pair: "BTCUSDT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Tiers collected, in processing order.
    pub tiers: Vec<ContractTier>,
    /// First leg of the spread (subtracted).
    pub spread_first: ContractTier,
    /// Second leg of the spread.
    pub spread_second: ContractTier,
    pub backfill_days: i64,
    pub backfill_window_days: i64,
    /// Six-field cron expression (seconds first) for the live flow.
    pub live_cron: String,
    pub live_spread_lookback_hours: i64,
    pub run_backfill_on_startup: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            tiers: ContractTier::all(),
            spread_first: ContractTier::NearQuarter,
            spread_second: ContractTier::FarQuarter,
            backfill_days: 365,
            backfill_window_days: 7,
            live_cron: "0 * * * * *".to_string(),
            live_spread_lookback_hours: 24,
            run_backfill_on_startup: true,
        }
    }
}

impl CollectionConfig {
    /// Length of the historical flow's range.
    ///
    /// # Errors
    /// Returns an error if `backfill_days` cannot be represented.
    pub fn backfill_span(&self) -> Result<Duration> {
        checked_days(self.backfill_days)
    }

    /// Length of one backfill window.
    ///
    /// # Errors
    /// Returns an error if `backfill_window_days` cannot be represented.
    pub fn backfill_window(&self) -> Result<Duration> {
        checked_days(self.backfill_window_days)
    }

    /// Trailing range the live flow recomputes spreads over.
    ///
    /// # Errors
    /// Returns an error if `live_spread_lookback_hours` cannot be represented.
    pub fn spread_lookback(&self) -> Result<Duration> {
        checked_hours(self.live_spread_lookback_hours)
    }
}

impl AppConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns an error describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let collection = &self.collection;

        if collection.tiers.is_empty() {
            return Err(anyhow!("collection.tiers must list at least one tier"));
        }
        if !(1..=MAX_BACKFILL_DAYS).contains(&collection.backfill_days) {
            return Err(anyhow!(
                "collection.backfill_days must be between 1 and {MAX_BACKFILL_DAYS}, got {}",
                collection.backfill_days
            ));
        }
        // A longer window spans more hourly candles than one request returns
        if !(1..=MAX_BACKFILL_WINDOW_DAYS).contains(&collection.backfill_window_days) {
            return Err(anyhow!(
                "collection.backfill_window_days must be between 1 and {MAX_BACKFILL_WINDOW_DAYS} \
                 ({MAX_CANDLES_PER_REQUEST} hourly candles per request), got {}",
                collection.backfill_window_days
            ));
        }
        if !(1..=MAX_SPREAD_LOOKBACK_HOURS).contains(&collection.live_spread_lookback_hours) {
            return Err(anyhow!(
                "collection.live_spread_lookback_hours must be between 1 and \
                 {MAX_SPREAD_LOOKBACK_HOURS}, got {}",
                collection.live_spread_lookback_hours
            ));
        }
        if collection.spread_first == collection.spread_second {
            return Err(anyhow!(
                "collection.spread_first and spread_second must differ (both {})",
                collection.spread_first.name()
            ));
        }
        for leg in [collection.spread_first, collection.spread_second] {
            if !collection.tiers.contains(&leg) {
                return Err(anyhow!(
                    "spread leg {} is not among collection.tiers",
                    leg.name()
                ));
            }
        }
        if self.exchange.requests_per_second == 0 {
            return Err(anyhow!("exchange.requests_per_second must be > 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection.backfill_window_days, 7);
        assert_eq!(config.exchange.pair, "BTCUSDT");
    }

    #[test]
    fn test_equal_spread_legs_rejected() {
        let mut config = AppConfig::default();
        config.collection.spread_second = ContractTier::NearQuarter;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_untracked_spread_leg_rejected() {
        let mut config = AppConfig::default();
        config.collection.tiers = vec![ContractTier::NearQuarter];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("far_quarter"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = AppConfig::default();
        config.collection.backfill_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_longer_than_one_request_rejected() {
        let mut config = AppConfig::default();
        config.collection.backfill_window_days = MAX_BACKFILL_WINDOW_DAYS;
        assert!(config.validate().is_ok());
        assert!(MAX_BACKFILL_WINDOW_DAYS * 24 <= i64::from(MAX_CANDLES_PER_REQUEST));

        config.collection.backfill_window_days = 60;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backfill_window_days"));
        assert!(err.to_string().contains("1000 hourly candles"));
    }

    #[test]
    fn test_oversized_spans_rejected() {
        let mut config = AppConfig::default();
        config.collection.backfill_days = 200_000_000_000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.collection.live_spread_lookback_hours = i64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations_from_valid_config() {
        let collection = CollectionConfig::default();
        assert_eq!(collection.backfill_span().unwrap(), Duration::days(365));
        assert_eq!(collection.backfill_window().unwrap(), Duration::days(7));
        assert_eq!(collection.spread_lookback().unwrap(), Duration::hours(24));
    }

    #[test]
    fn test_unrepresentable_duration_is_error() {
        let collection = CollectionConfig {
            backfill_days: 200_000_000_000,
            ..CollectionConfig::default()
        };
        assert!(collection.backfill_span().is_err());
    }

    #[test]
    fn test_empty_tiers_rejected() {
        let mut config = AppConfig::default();
        config.collection.tiers.clear();
        assert!(config.validate().is_err());
    }
}
