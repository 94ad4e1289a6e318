//! Hourly price sample model.

use anyhow::{anyhow, Result};
use basis_core::{truncate_to_hour, ContractTier};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One hour-bucketed price observation for a tier.
///
/// At most one sample exists per `(tier, timestamp)`; writing a second one
/// overwrites `price` and `is_latest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub tier: ContractTier,
    pub price: Decimal,
    /// Start of the UTC hour this sample represents.
    pub timestamp: DateTime<Utc>,
    /// Advisory marker for the newest bucket of a collection run.
    pub is_latest: bool,
}

impl PriceSample {
    /// Creates a sample, truncating `timestamp` to its hour bucket.
    #[must_use]
    pub fn new(tier: ContractTier, price: Decimal, timestamp: DateTime<Utc>, is_latest: bool) -> Self {
        Self {
            tier,
            price,
            timestamp: truncate_to_hour(timestamp),
            is_latest,
        }
    }

    /// Uniqueness key in the store.
    #[must_use]
    pub fn key(&self) -> (ContractTier, DateTime<Utc>) {
        (self.tier, self.timestamp)
    }
}

/// Raw `price_samples` row; `tier` holds the stable tier code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceSampleRow {
    pub tier: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub is_latest: bool,
}

impl TryFrom<PriceSampleRow> for PriceSample {
    type Error = anyhow::Error;

    fn try_from(row: PriceSampleRow) -> Result<Self> {
        let tier = ContractTier::from_code(&row.tier)
            .ok_or_else(|| anyhow!("Unknown tier code in price_samples: {}", row.tier))?;
        Ok(Self {
            tier,
            price: row.price,
            timestamp: row.timestamp,
            is_latest: row.is_latest,
        })
    }
}
