//! Read/write contract between the collection pipeline and storage.

use anyhow::Result;
use async_trait::async_trait;
use basis_core::ContractTier;
use chrono::{DateTime, Utc};

use crate::models::{PriceDifference, PriceSample};

/// Default row cap for the top-N read queries.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Storage for price samples and spreads.
///
/// Sample writes are upserts keyed by `(tier, timestamp)`: concurrent writers
/// of the same bucket resolve to last-writer-wins, never duplicates.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Upserts samples as one unit and returns how many were written.
    async fn upsert_samples(&self, samples: &[PriceSample]) -> Result<u64>;

    /// Samples with `start <= timestamp <= end`, oldest first.
    async fn samples_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>>;

    /// Newest samples across all tiers, timestamp descending.
    async fn all_samples(&self, max_items: usize) -> Result<Vec<PriceSample>>;

    /// Newest samples of one tier, timestamp descending.
    async fn samples_by_tier(&self, tier: ContractTier, max_items: usize)
        -> Result<Vec<PriceSample>>;

    async fn latest_sample(&self, tier: ContractTier) -> Result<Option<PriceSample>>;

    /// Persists spreads as one batch; recomputed rows replace earlier ones.
    async fn save_differences(&self, differences: &[PriceDifference]) -> Result<u64>;

    /// Newest spreads, first-leg timestamp descending.
    async fn all_differences(&self, max_items: usize) -> Result<Vec<PriceDifference>>;

    /// Newest spreads with `tier` on either leg, first-leg timestamp descending.
    async fn differences_by_tier(
        &self,
        tier: ContractTier,
        max_items: usize,
    ) -> Result<Vec<PriceDifference>>;

    /// Spreads whose second-leg timestamp lies in `[start, end]`, oldest first.
    async fn differences_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceDifference>>;
}
