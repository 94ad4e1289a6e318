//! Spread between two tiers for one hour bucket.

use anyhow::{anyhow, Result};
use basis_core::ContractTier;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PriceSample;

/// Derived spread record. `difference = second_price - first_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDifference {
    pub first_tier: ContractTier,
    pub second_tier: ContractTier,
    pub first_price: Decimal,
    pub second_price: Decimal,
    pub difference: Decimal,
    pub first_timestamp: DateTime<Utc>,
    pub second_timestamp: DateTime<Utc>,
}

/// Key the store uses to refresh instead of duplicate a recomputed spread.
pub type DifferenceKey = (ContractTier, ContractTier, DateTime<Utc>, DateTime<Utc>);

impl PriceDifference {
    /// Builds the spread between two legs.
    #[must_use]
    pub fn between(first: &PriceSample, second: &PriceSample) -> Self {
        Self {
            first_tier: first.tier,
            second_tier: second.tier,
            first_price: first.price,
            second_price: second.price,
            difference: second.price - first.price,
            first_timestamp: first.timestamp,
            second_timestamp: second.timestamp,
        }
    }

    #[must_use]
    pub fn key(&self) -> DifferenceKey {
        (
            self.first_tier,
            self.second_tier,
            self.first_timestamp,
            self.second_timestamp,
        )
    }

    /// Returns true if either leg is `tier`.
    #[must_use]
    pub fn involves(&self, tier: ContractTier) -> bool {
        self.first_tier == tier || self.second_tier == tier
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceDifferenceRow {
    pub first_tier: String,
    pub second_tier: String,
    pub first_price: Decimal,
    pub second_price: Decimal,
    pub difference: Decimal,
    pub first_timestamp: DateTime<Utc>,
    pub second_timestamp: DateTime<Utc>,
}

impl TryFrom<PriceDifferenceRow> for PriceDifference {
    type Error = anyhow::Error;

    fn try_from(row: PriceDifferenceRow) -> Result<Self> {
        let decode = |code: &str| {
            ContractTier::from_code(code)
                .ok_or_else(|| anyhow!("Unknown tier code in price_differences: {}", code))
        };
        Ok(Self {
            first_tier: decode(&row.first_tier)?,
            second_tier: decode(&row.second_tier)?,
            first_price: row.first_price,
            second_price: row.second_price,
            difference: row.difference,
            first_timestamp: row.first_timestamp,
            second_timestamp: row.second_timestamp,
        })
    }
}
