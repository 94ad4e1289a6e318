//! Price difference repository.

use anyhow::{Context, Result};
use basis_core::ContractTier;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{PriceDifference, PriceDifferenceRow};

/// Repository for `price_differences`.
///
/// Rows are keyed by both legs and both leg timestamps, so recomputing a
/// range refreshes existing rows.
#[derive(Debug, Clone)]
pub struct PriceDifferenceRepository {
    pool: PgPool,
}

impl PriceDifferenceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes a batch of differences in one transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn upsert_batch(&self, differences: &[PriceDifference]) -> Result<u64> {
        if differences.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;

        for chunk in differences.chunks(100) {
            for diff in chunk {
                let result = sqlx::query(
                    r#"
                    INSERT INTO price_differences
                        (first_tier, second_tier, first_price, second_price, difference,
                         first_timestamp, second_timestamp)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ON CONFLICT (first_tier, second_tier, first_timestamp, second_timestamp)
                    DO UPDATE SET
                        first_price = EXCLUDED.first_price,
                        second_price = EXCLUDED.second_price,
                        difference = EXCLUDED.difference
                    "#,
                )
                .bind(diff.first_tier.code())
                .bind(diff.second_tier.code())
                .bind(diff.first_price)
                .bind(diff.second_price)
                .bind(diff.difference)
                .bind(diff.first_timestamp)
                .bind(diff.second_timestamp)
                .execute(&mut *tx)
                .await?;
                written += result.rows_affected();
            }
        }

        tx.commit().await.context("Failed to commit price differences")?;
        Ok(written)
    }

    /// Newest differences by first-leg timestamp.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_recent(&self, limit: i64) -> Result<Vec<PriceDifference>> {
        let rows = sqlx::query_as::<_, PriceDifferenceRow>(
            r#"
            SELECT first_tier, second_tier, first_price, second_price, difference,
                   first_timestamp, second_timestamp
            FROM price_differences
            ORDER BY first_timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceDifference::try_from).collect()
    }

    /// Newest differences where either leg is `tier`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_by_tier(
        &self,
        tier: ContractTier,
        limit: i64,
    ) -> Result<Vec<PriceDifference>> {
        let rows = sqlx::query_as::<_, PriceDifferenceRow>(
            r#"
            SELECT first_tier, second_tier, first_price, second_price, difference,
                   first_timestamp, second_timestamp
            FROM price_differences
            WHERE first_tier = $1 OR second_tier = $1
            ORDER BY first_timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(tier.code())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceDifference::try_from).collect()
    }

    /// Differences whose second-leg timestamp lies in `[start, end]`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceDifference>> {
        let rows = sqlx::query_as::<_, PriceDifferenceRow>(
            r#"
            SELECT first_tier, second_tier, first_price, second_price, difference,
                   first_timestamp, second_timestamp
            FROM price_differences
            WHERE second_timestamp >= $1 AND second_timestamp <= $2
            ORDER BY second_timestamp ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceDifference::try_from).collect()
    }
}
