//! Spread computation between two tiers over hour buckets.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use basis_core::{truncate_to_hour, ContractTier, TimeRange};
use basis_data::{PriceDifference, PriceSample, PriceStore};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Pairs the two legs within each hour and emits `second - first`.
///
/// For each hour the most recent sample of each leg is used. Hours missing
/// either leg produce nothing.
#[must_use]
pub fn compute_spreads(
    samples: &[PriceSample],
    first: ContractTier,
    second: ContractTier,
) -> Vec<PriceDifference> {
    type Legs<'a> = (Option<&'a PriceSample>, Option<&'a PriceSample>);

    fn newer<'a>(
        current: Option<&'a PriceSample>,
        candidate: &'a PriceSample,
    ) -> Option<&'a PriceSample> {
        match current {
            Some(existing) if existing.timestamp >= candidate.timestamp => Some(existing),
            _ => Some(candidate),
        }
    }

    let mut hours: BTreeMap<DateTime<Utc>, Legs<'_>> = BTreeMap::new();
    for sample in samples {
        let legs = hours.entry(truncate_to_hour(sample.timestamp)).or_default();
        if sample.tier == first {
            legs.0 = newer(legs.0, sample);
        } else if sample.tier == second {
            legs.1 = newer(legs.1, sample);
        }
    }

    hours
        .into_values()
        .filter_map(|legs| match legs {
            (Some(a), Some(b)) => Some(PriceDifference::between(a, b)),
            _ => None,
        })
        .collect()
}

/// Loads samples for a range and persists their spreads.
pub struct SpreadCalculator {
    store: Arc<dyn PriceStore>,
    first: ContractTier,
    second: ContractTier,
}

impl SpreadCalculator {
    #[must_use]
    pub fn new(store: Arc<dyn PriceStore>, first: ContractTier, second: ContractTier) -> Self {
        Self {
            store,
            first,
            second,
        }
    }

    /// Computes and saves the spreads for every complete hour in `range`.
    ///
    /// Returns the number of spreads saved.
    ///
    /// # Errors
    /// Returns an error if loading samples or saving spreads fails.
    pub async fn compute_differences(&self, range: TimeRange) -> Result<u64> {
        let samples = self
            .store
            .samples_in_period(range.start, range.end)
            .await
            .context("Failed to load samples for spread computation")?;

        if samples.is_empty() {
            warn!(start = %range.start, end = %range.end, "No samples in range, skipping spreads");
            return Ok(0);
        }

        let differences = compute_spreads(&samples, self.first, self.second);
        let saved = self
            .store
            .save_differences(&differences)
            .await
            .context("Failed to save price differences")?;

        info!(
            first = %self.first,
            second = %self.second,
            samples = samples.len(),
            saved,
            "Computed spreads"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 30, 11, 0, 0).unwrap()
    }

    fn near(price: rust_decimal::Decimal, hour: i64) -> PriceSample {
        PriceSample::new(
            ContractTier::NearQuarter,
            price,
            sample_timestamp() + Duration::hours(hour),
            false,
        )
    }

    fn far(price: rust_decimal::Decimal, hour: i64) -> PriceSample {
        PriceSample::new(
            ContractTier::FarQuarter,
            price,
            sample_timestamp() + Duration::hours(hour),
            false,
        )
    }

    #[test]
    fn test_sign_is_second_minus_first() {
        let diffs = compute_spreads(
            &[near(dec!(100), 0), far(dec!(105), 0)],
            ContractTier::NearQuarter,
            ContractTier::FarQuarter,
        );

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].difference, dec!(5));
        assert_eq!(diffs[0].first_timestamp, sample_timestamp());
    }

    #[test]
    fn test_missing_leg_skipped() {
        let diffs = compute_spreads(
            &[near(dec!(100), 0), near(dec!(101), 1), far(dec!(106), 1)],
            ContractTier::NearQuarter,
            ContractTier::FarQuarter,
        );

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].first_timestamp, sample_timestamp() + Duration::hours(1));
    }

    #[test]
    fn test_reversed_legs() {
        let diffs = compute_spreads(
            &[near(dec!(100), 0), far(dec!(105), 0)],
            ContractTier::FarQuarter,
            ContractTier::NearQuarter,
        );
        assert_eq!(diffs[0].difference, dec!(-5));
    }

    #[test]
    fn test_most_recent_sample_per_leg_wins() {
        let mut late = near(dec!(90), 0);
        late.timestamp = sample_timestamp() + Duration::minutes(30);

        let diffs = compute_spreads(
            &[near(dec!(100), 0), late, far(dec!(105), 0)],
            ContractTier::NearQuarter,
            ContractTier::FarQuarter,
        );
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].first_price, dec!(90));
        assert_eq!(diffs[0].difference, dec!(15));
    }

    #[test]
    fn test_output_ordered_by_hour() {
        let diffs = compute_spreads(
            &[far(dec!(3), 2), near(dec!(1), 2), far(dec!(2), 0), near(dec!(1), 0)],
            ContractTier::NearQuarter,
            ContractTier::FarQuarter,
        );
        let values: Vec<_> = diffs.iter().map(|d| d.difference).collect();
        assert_eq!(values, vec![dec!(1), dec!(2)]);
    }

    #[test]
    fn test_no_samples() {
        assert!(compute_spreads(&[], ContractTier::NearQuarter, ContractTier::FarQuarter).is_empty());
    }
}
