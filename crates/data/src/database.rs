use anyhow::{Context, Result};
use async_trait::async_trait;
use basis_core::{ContractTier, DatabaseConfig};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use crate::models::{PriceDifference, PriceSample};
use crate::repositories::Repositories;
use crate::store::PriceStore;

/// Postgres-backed [`PriceStore`].
#[derive(Debug, Clone)]
pub struct PgPriceStore {
    pool: PgPool,
    repos: Repositories,
}

impl PgPriceStore {
    /// Connects to the configured Postgres database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        let repos = Repositories::new(pool.clone());
        Self { pool, repos }
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn limit(max_items: usize) -> i64 {
    i64::try_from(max_items).unwrap_or(i64::MAX)
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn upsert_samples(&self, samples: &[PriceSample]) -> Result<u64> {
        let written = self.repos.samples.upsert_batch(samples).await?;
        debug!(written, "Upserted price samples");
        Ok(written)
    }

    async fn samples_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceSample>> {
        self.repos.samples.query_by_time_range(start, end).await
    }

    async fn all_samples(&self, max_items: usize) -> Result<Vec<PriceSample>> {
        self.repos.samples.query_recent(limit(max_items)).await
    }

    async fn samples_by_tier(
        &self,
        tier: ContractTier,
        max_items: usize,
    ) -> Result<Vec<PriceSample>> {
        self.repos.samples.query_by_tier(tier, limit(max_items)).await
    }

    async fn latest_sample(&self, tier: ContractTier) -> Result<Option<PriceSample>> {
        self.repos.samples.get_latest(tier).await
    }

    async fn save_differences(&self, differences: &[PriceDifference]) -> Result<u64> {
        let written = self.repos.differences.upsert_batch(differences).await?;
        debug!(written, "Saved price differences");
        Ok(written)
    }

    async fn all_differences(&self, max_items: usize) -> Result<Vec<PriceDifference>> {
        self.repos.differences.query_recent(limit(max_items)).await
    }

    async fn differences_by_tier(
        &self,
        tier: ContractTier,
        max_items: usize,
    ) -> Result<Vec<PriceDifference>> {
        self.repos
            .differences
            .query_by_tier(tier, limit(max_items))
            .await
    }

    async fn differences_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceDifference>> {
        self.repos.differences.query_by_time_range(start, end).await
    }
}
