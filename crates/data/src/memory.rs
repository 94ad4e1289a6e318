//! In-process [`PriceStore`] used for dry runs and tests.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use basis_core::ContractTier;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{DifferenceKey, PriceDifference, PriceSample};
use crate::store::PriceStore;

#[derive(Debug, Default)]
struct Tables {
    samples: BTreeMap<(ContractTier, DateTime<Utc>), PriceSample>,
    differences: BTreeMap<DifferenceKey, PriceDifference>,
}

/// Keeps samples and spreads in ordered maps with the same keys and
/// overwrite rules as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    tables: RwLock<Tables>,
}

impl MemoryPriceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sample_count(&self) -> usize {
        self.tables.read().await.samples.len()
    }

    pub async fn difference_count(&self) -> usize {
        self.tables.read().await.differences.len()
    }
}

fn newest_samples<'a>(
    samples: impl Iterator<Item = &'a PriceSample>,
    max_items: usize,
) -> Vec<PriceSample> {
    let mut rows: Vec<PriceSample> = samples.cloned().collect();
    rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.tier.cmp(&b.tier)));
    rows.truncate(max_items);
    rows
}

fn newest_differences<'a>(
    differences: impl Iterator<Item = &'a PriceDifference>,
    max_items: usize,
) -> Vec<PriceDifference> {
    let mut rows: Vec<PriceDifference> = differences.cloned().collect();
    rows.sort_by(|a, b| b.first_timestamp.cmp(&a.first_timestamp));
    rows.truncate(max_items);
    rows
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn upsert_samples(&self, samples: &[PriceSample]) -> Result<u64> {
        let mut tables = self.tables.write().await;
        for sample in samples {
            tables.samples.insert(sample.key(), sample.clone());
        }
        Ok(samples.len() as u64)
    }

    async fn samples_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PriceSample> = tables
            .samples
            .values()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.tier.cmp(&b.tier)));
        Ok(rows)
    }

    async fn all_samples(&self, max_items: usize) -> Result<Vec<PriceSample>> {
        let tables = self.tables.read().await;
        Ok(newest_samples(tables.samples.values(), max_items))
    }

    async fn samples_by_tier(
        &self,
        tier: ContractTier,
        max_items: usize,
    ) -> Result<Vec<PriceSample>> {
        let tables = self.tables.read().await;
        Ok(newest_samples(
            tables.samples.values().filter(|s| s.tier == tier),
            max_items,
        ))
    }

    async fn latest_sample(&self, tier: ContractTier) -> Result<Option<PriceSample>> {
        let tables = self.tables.read().await;
        Ok(tables
            .samples
            .values()
            .filter(|s| s.tier == tier)
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    async fn save_differences(&self, differences: &[PriceDifference]) -> Result<u64> {
        let mut tables = self.tables.write().await;
        for diff in differences {
            tables.differences.insert(diff.key(), diff.clone());
        }
        Ok(differences.len() as u64)
    }

    async fn all_differences(&self, max_items: usize) -> Result<Vec<PriceDifference>> {
        let tables = self.tables.read().await;
        Ok(newest_differences(tables.differences.values(), max_items))
    }

    async fn differences_by_tier(
        &self,
        tier: ContractTier,
        max_items: usize,
    ) -> Result<Vec<PriceDifference>> {
        let tables = self.tables.read().await;
        Ok(newest_differences(
            tables.differences.values().filter(|d| d.involves(tier)),
            max_items,
        ))
    }

    async fn differences_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceDifference>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PriceDifference> = tables
            .differences
            .values()
            .filter(|d| d.second_timestamp >= start && d.second_timestamp <= end)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.second_timestamp.cmp(&b.second_timestamp));
        Ok(rows)
    }
}
