//! Sequences the live and historical flows.
//!
//! Live: collect current prices, then recompute spreads over the trailing
//! lookback. Historical: backfill `[now - backfill_days, now]`, then
//! recompute spreads over the same range.

use std::sync::Arc;

use anyhow::{Context, Result};
use basis_binance::BinanceFuturesClient;
use basis_core::{AppConfig, TimeRange};
use basis_data::PriceStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backfill::{BackfillStats, HistoricalBackfiller};
use crate::live::LiveCollector;
use crate::spread::SpreadCalculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Live,
    Historical,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Historical => write!(f, "historical"),
        }
    }
}

/// Summary of one flow execution.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub flow: Flow,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Hourly samples upserted
    pub samples_written: u64,
    /// Spread rows upserted
    pub differences_written: u64,
    /// Isolated per-tier or per-window failures
    pub failures: u64,
    /// Flow stopped early; the spread step was skipped
    pub cancelled: bool,
    /// Per-window detail for the historical flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfill: Option<BackfillStats>,
}

impl FlowReport {
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} flow: {} samples, {} differences, {} failures in {}s{}",
            self.flow,
            self.samples_written,
            self.differences_written,
            self.failures,
            (self.finished_at - self.started_at).num_seconds(),
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

/// Glue between the external trigger and the collection components.
pub struct CollectionOrchestrator {
    live: LiveCollector,
    backfiller: HistoricalBackfiller,
    spreads: SpreadCalculator,
    /// Trailing range of the live flow's spread step
    spread_lookback: Duration,
    /// Length of the historical flow's range
    backfill_span: Duration,
}

impl CollectionOrchestrator {
    /// # Errors
    /// Returns an error if a configured span cannot be represented.
    pub fn new(
        client: Arc<BinanceFuturesClient>,
        store: Arc<dyn PriceStore>,
        config: &AppConfig,
    ) -> Result<Self> {
        Ok(Self {
            live: LiveCollector::new(Arc::clone(&client), Arc::clone(&store), config),
            backfiller: HistoricalBackfiller::new(client, Arc::clone(&store), config)?,
            spreads: SpreadCalculator::new(
                store,
                config.collection.spread_first,
                config.collection.spread_second,
            ),
            spread_lookback: config.collection.spread_lookback()?,
            backfill_span: config.collection.backfill_span()?,
        })
    }

    /// Builds the exchange client from config and wires the components.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or a configured
    /// span cannot be represented.
    pub fn from_config(config: &AppConfig, store: Arc<dyn PriceStore>) -> Result<Self> {
        let client = BinanceFuturesClient::new(&config.exchange)
            .context("Failed to build exchange client")?;
        Self::new(Arc::new(client), store, config)
    }

    /// Live flow: current prices, then spreads over the trailing lookback.
    ///
    /// # Errors
    /// Returns an error if the sample flush or the spread step fails.
    pub async fn run_live(&self, cancel: &CancellationToken) -> Result<FlowReport> {
        let started_at = Utc::now();
        let report = self.live.collect_at(started_at, cancel).await?;

        let lookback = self.spread_lookback;
        let differences_written = if report.cancelled {
            0
        } else {
            self.spreads
                .compute_differences(TimeRange::new(started_at - lookback, started_at))
                .await?
        };

        let flow = FlowReport {
            flow: Flow::Live,
            started_at,
            finished_at: Utc::now(),
            samples_written: report.written,
            differences_written,
            failures: report.failures.len() as u64,
            cancelled: report.cancelled,
            backfill: None,
        };
        info!("{}", flow.summary());
        Ok(flow)
    }

    /// Historical flow over the configured `backfill_days`.
    ///
    /// # Errors
    /// Returns an error if the spread step fails.
    pub async fn run_historical(&self, cancel: &CancellationToken) -> Result<FlowReport> {
        let end = Utc::now();
        self.run_backfill(TimeRange::new(end - self.backfill_span, end), cancel)
            .await
    }

    /// Backfills `range` and recomputes its spreads.
    ///
    /// # Errors
    /// Returns an error if the spread step fails.
    pub async fn run_backfill(
        &self,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> Result<FlowReport> {
        let started_at = Utc::now();
        let stats = self.backfiller.backfill(range, cancel).await;

        let differences_written = if stats.cancelled {
            0
        } else {
            self.spreads.compute_differences(range).await?
        };

        let flow = FlowReport {
            flow: Flow::Historical,
            started_at,
            finished_at: Utc::now(),
            samples_written: stats.buckets_written,
            differences_written,
            failures: stats.failures,
            cancelled: stats.cancelled,
            backfill: Some(stats),
        };
        info!("{}", flow.summary());
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_data::MemoryPriceStore;
    use chrono::TimeZone;

    #[test]
    fn test_flow_report_summary() {
        let started_at = Utc.with_ymd_and_hms(2025, 3, 30, 11, 0, 0).unwrap();
        let report = FlowReport {
            flow: Flow::Live,
            started_at,
            finished_at: started_at + Duration::seconds(2),
            samples_written: 2,
            differences_written: 24,
            failures: 0,
            cancelled: false,
            backfill: None,
        };

        assert_eq!(
            report.summary(),
            "live flow: 2 samples, 24 differences, 0 failures in 2s"
        );
    }

    #[test]
    fn test_unrepresentable_backfill_span_is_error() {
        let mut config = AppConfig::default();
        config.collection.backfill_days = 200_000_000_000;
        let client = Arc::new(BinanceFuturesClient::new(&config.exchange).unwrap());
        let store: Arc<dyn PriceStore> = Arc::new(MemoryPriceStore::new());

        let err = CollectionOrchestrator::new(client, store, &config)
            .err()
            .unwrap();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_flow_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Flow::Historical).unwrap(), "\"historical\"");
    }
}
