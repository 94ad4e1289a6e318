//! Chunked historical backfill.
//!
//! The candle endpoint caps each response, so the requested range is split
//! into fixed windows and every (window, tier) pair is fetched, aggregated
//! and upserted on its own. One failing pair is logged and skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use basis_binance::client::KLINE_LIMIT;
use basis_binance::{parse_candles, BinanceFuturesClient, Candle, SymbolResolver};
use basis_core::{truncate_to_hour, AppConfig, ContractTier, TimeRange};
use basis_data::{PriceSample, PriceStore};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Statistics for a backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillStats {
    /// Windows the range was split into
    pub windows: u64,
    /// (window, tier) pairs attempted
    pub attempts: u64,
    /// (window, tier) pairs that failed and were skipped
    pub failures: u64,
    /// Well-formed candles parsed across all windows
    pub candles_fetched: u64,
    /// Malformed candle rows skipped
    pub candles_skipped: u64,
    /// Hour buckets upserted
    pub buckets_written: u64,
    /// Run stopped early on the cancellation token
    pub cancelled: bool,
}

impl BackfillStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats a summary report.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Windows: {}, Attempts: {}, Failed: {}, Candles: {} ({} skipped), Buckets: {}{}",
            self.windows,
            self.attempts,
            self.failures,
            self.candles_fetched,
            self.candles_skipped,
            self.buckets_written,
            if self.cancelled { ", cancelled" } else { "" }
        )
    }
}

/// Collapses candles into one sample per hour using the mean close.
///
/// The bucket at or after `overall_end - 1h` is flagged `is_latest`.
#[must_use]
pub fn aggregate_hourly(
    tier: ContractTier,
    candles: &[Candle],
    overall_end: DateTime<Utc>,
) -> Vec<PriceSample> {
    let mut buckets: BTreeMap<DateTime<Utc>, (Decimal, u32)> = BTreeMap::new();
    for candle in candles {
        let entry = buckets
            .entry(truncate_to_hour(candle.open_time))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += candle.close;
        entry.1 += 1;
    }

    let latest_from = overall_end - Duration::hours(1);
    buckets
        .into_iter()
        .map(|(hour, (sum, count))| {
            PriceSample::new(tier, sum / Decimal::from(count), hour, hour >= latest_from)
        })
        .collect()
}

/// Backfills hourly samples for a range, window by window.
pub struct HistoricalBackfiller {
    client: Arc<BinanceFuturesClient>,
    resolver: SymbolResolver,
    store: Arc<dyn PriceStore>,
    pair: String,
    tiers: Vec<ContractTier>,
    window: Duration,
}

impl HistoricalBackfiller {
    /// # Errors
    /// Returns an error if the configured window length cannot be represented.
    pub fn new(
        client: Arc<BinanceFuturesClient>,
        store: Arc<dyn PriceStore>,
        config: &AppConfig,
    ) -> Result<Self> {
        Ok(Self {
            resolver: SymbolResolver::new(Arc::clone(&client), &config.exchange),
            window: config.collection.backfill_window()?,
            client,
            store,
            pair: config.exchange.pair.clone(),
            tiers: config.collection.tiers.clone(),
        })
    }

    /// Backfills `range`, returning what was written.
    ///
    /// Never fails because of one (window, tier) pair; those are counted in
    /// `failures`. Cancellation stops before the next pair and keeps what
    /// was already written.
    pub async fn backfill(&self, range: TimeRange, cancel: &CancellationToken) -> BackfillStats {
        let mut stats = BackfillStats::new();
        let windows = range.partition(self.window);
        if windows.is_empty() {
            warn!(start = %range.start, end = %range.end, "Empty backfill range");
            return stats;
        }

        stats.windows = windows.len() as u64;
        info!(
            start = %range.start,
            end = %range.end,
            windows = windows.len(),
            tiers = self.tiers.len(),
            "Starting backfill"
        );

        'windows: for window in &windows {
            for &tier in &self.tiers {
                if cancel.is_cancelled() {
                    stats.cancelled = true;
                    break 'windows;
                }

                stats.attempts += 1;
                match self.backfill_window(tier, *window, range.end, cancel, &mut stats).await {
                    Ok(written) => {
                        stats.buckets_written += written;
                        debug!(tier = %tier, window_start = %window.start, written, "Window done");
                    }
                    Err(e) => {
                        if cancel.is_cancelled() {
                            stats.cancelled = true;
                            break 'windows;
                        }
                        stats.failures += 1;
                        error!(
                            tier = %tier,
                            window_start = %window.start,
                            window_end = %window.end,
                            error = %format!("{e:#}"),
                            "Backfill window failed"
                        );
                    }
                }
            }
        }

        info!("Backfill finished: {}", stats.summary());
        stats
    }

    async fn backfill_window(
        &self,
        tier: ContractTier,
        window: TimeRange,
        overall_end: DateTime<Utc>,
        cancel: &CancellationToken,
        stats: &mut BackfillStats,
    ) -> Result<u64> {
        let resolved = self
            .resolver
            .resolve(tier, cancel)
            .await
            .with_context(|| format!("Failed to resolve {tier}"))?;

        // endTime is inclusive upstream; stop 1ms short to keep windows half-open
        let rows = self
            .client
            .get_continuous_klines(
                &self.pair,
                &resolved.contract_type,
                window.start,
                window.end - Duration::milliseconds(1),
                cancel,
            )
            .await
            .with_context(|| format!("Failed to fetch candles for {}", resolved.symbol))?;

        // A full page means the exchange cut the window short
        if rows.len() >= KLINE_LIMIT as usize {
            bail!(
                "{} returned {} candles for a {}h window; response was capped",
                resolved.symbol,
                rows.len(),
                window.duration().num_hours()
            );
        }

        let parsed = parse_candles(&rows);
        stats.candles_fetched += parsed.candles.len() as u64;
        stats.candles_skipped += parsed.skipped as u64;

        let in_window: Vec<Candle> = parsed
            .candles
            .into_iter()
            .filter(|c| c.open_time >= window.start && c.open_time < window.end)
            .collect();

        let samples = aggregate_hourly(tier, &in_window, overall_end);
        if samples.is_empty() {
            return Ok(0);
        }

        self.store
            .upsert_samples(&samples)
            .await
            .with_context(|| format!("Failed to store {} samples for {tier}", samples.len()))
    }
}
