//! Postgres repositories for price samples and spreads.
//!
//! Each repository wraps one table with batch upserts and time-range queries.

pub mod price_difference_repo;
pub mod price_sample_repo;

pub use price_difference_repo::PriceDifferenceRepository;
pub use price_sample_repo::PriceSampleRepository;

use sqlx::PgPool;

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub samples: PriceSampleRepository,
    pub differences: PriceDifferenceRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            samples: PriceSampleRepository::new(pool.clone()),
            differences: PriceDifferenceRepository::new(pool),
        }
    }
}
