//! Price sample repository.
//!
//! Upserts hour-bucketed samples keyed by `(tier, timestamp)` and serves the
//! read queries exposed to API consumers.

use anyhow::{Context, Result};
use basis_core::ContractTier;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{PriceSample, PriceSampleRow};

const UPSERT_SQL: &str = r#"
    INSERT INTO price_samples (tier, price, timestamp, is_latest)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (tier, timestamp) DO UPDATE SET
        price = EXCLUDED.price,
        is_latest = EXCLUDED.is_latest
"#;

/// Repository for `price_samples`.
#[derive(Debug, Clone)]
pub struct PriceSampleRepository {
    pool: PgPool,
}

impl PriceSampleRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a batch of samples in one transaction.
    ///
    /// Returns the number of rows inserted or updated.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing from the batch is kept.
    pub async fn upsert_batch(&self, samples: &[PriceSample]) -> Result<u64> {
        if samples.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;

        for chunk in samples.chunks(100) {
            for sample in chunk {
                let result = sqlx::query(UPSERT_SQL)
                    .bind(sample.tier.code())
                    .bind(sample.price)
                    .bind(sample.timestamp)
                    .bind(sample.is_latest)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| {
                        format!("Failed to upsert {} sample at {}", sample.tier, sample.timestamp)
                    })?;
                written += result.rows_affected();
            }
        }

        tx.commit().await.context("Failed to commit price samples")?;
        Ok(written)
    }

    /// Samples with `start <= timestamp <= end`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row carries an unknown tier code.
    pub async fn query_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>> {
        let rows = sqlx::query_as::<_, PriceSampleRow>(
            r#"
            SELECT tier, price, timestamp, is_latest
            FROM price_samples
            WHERE timestamp >= $1 AND timestamp <= $2
            ORDER BY timestamp ASC, tier ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceSample::try_from).collect()
    }

    /// Newest samples across all tiers.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_recent(&self, limit: i64) -> Result<Vec<PriceSample>> {
        let rows = sqlx::query_as::<_, PriceSampleRow>(
            r#"
            SELECT tier, price, timestamp, is_latest
            FROM price_samples
            ORDER BY timestamp DESC, tier ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceSample::try_from).collect()
    }

    /// Newest samples for one tier.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_by_tier(&self, tier: ContractTier, limit: i64) -> Result<Vec<PriceSample>> {
        let rows = sqlx::query_as::<_, PriceSampleRow>(
            r#"
            SELECT tier, price, timestamp, is_latest
            FROM price_samples
            WHERE tier = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(tier.code())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PriceSample::try_from).collect()
    }

    /// Gets the most recent sample for a tier.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_latest(&self, tier: ContractTier) -> Result<Option<PriceSample>> {
        let row = sqlx::query_as::<_, PriceSampleRow>(
            r#"
            SELECT tier, price, timestamp, is_latest
            FROM price_samples
            WHERE tier = $1
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(tier.code())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PriceSample::try_from).transpose()
    }
}
