//! Current-price collection for every tracked tier.

use std::sync::Arc;

use anyhow::{Context, Result};
use basis_binance::{BinanceFuturesClient, ExchangeError, PriceFetcher, SymbolResolver};
use basis_core::{AppConfig, ContractTier};
use basis_data::{PriceSample, PriceStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Outcome of one live collection pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LiveReport {
    /// Samples gathered this pass, in tier order
    pub samples: Vec<PriceSample>,
    /// Tiers that failed, with the error text
    pub failures: Vec<(ContractTier, String)>,
    /// Rows the store reported as upserted
    pub written: u64,
    /// Pass stopped early on the cancellation token
    pub cancelled: bool,
}

/// Resolves, prices and upserts the current hour for each tier.
pub struct LiveCollector {
    resolver: SymbolResolver,
    prices: PriceFetcher,
    store: Arc<dyn PriceStore>,
    tiers: Vec<ContractTier>,
}

impl LiveCollector {
    #[must_use]
    pub fn new(
        client: Arc<BinanceFuturesClient>,
        store: Arc<dyn PriceStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            resolver: SymbolResolver::new(Arc::clone(&client), &config.exchange),
            prices: PriceFetcher::new(client),
            store,
            tiers: config.collection.tiers.clone(),
        }
    }

    /// Collects the current price of every tier into the current hour bucket.
    ///
    /// # Errors
    /// Returns an error only if the final batch write fails.
    pub async fn collect_current(&self, cancel: &CancellationToken) -> Result<LiveReport> {
        self.collect_at(Utc::now(), cancel).await
    }

    /// Same as [`collect_current`](Self::collect_current) with an explicit clock.
    ///
    /// Tiers are processed in configured order. A failing tier is logged and
    /// skipped; whatever was gathered is written in one batch at the end,
    /// including after cancellation.
    ///
    /// # Errors
    /// Returns an error only if the final batch write fails.
    pub async fn collect_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<LiveReport> {
        let mut report = LiveReport::default();

        for &tier in &self.tiers {
            match self.fetch_tier(tier, now, cancel).await {
                Ok(sample) => report.samples.push(sample),
                Err(ExchangeError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!(
                        tier = %tier,
                        error = %e,
                        transient = e.is_transient(),
                        "Live collection failed"
                    );
                    report.failures.push((tier, e.to_string()));
                }
            }
        }

        report.written = self
            .store
            .upsert_samples(&report.samples)
            .await
            .context("Failed to flush live samples")?;

        info!(
            written = report.written,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "Live collection complete"
        );
        Ok(report)
    }

    async fn fetch_tier(
        &self,
        tier: ContractTier,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> basis_binance::Result<PriceSample> {
        let resolved = self.resolver.resolve(tier, cancel).await?;
        let price = self.prices.fetch_latest(&resolved, cancel).await?;
        info!(tier = %tier, symbol = %resolved.symbol, price = %price, "Fetched price");
        Ok(PriceSample::new(tier, price, now, true))
    }
}
