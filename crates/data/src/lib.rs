//! Storage for quarterly futures price samples and spreads.
//!
//! This crate provides:
//! - `PriceSample` / `PriceDifference` models
//! - The `PriceStore` contract used by the collection pipeline
//! - A Postgres implementation with migrations, plus an in-memory one

pub mod database;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use database::PgPriceStore;
pub use memory::MemoryPriceStore;
pub use models::{PriceDifference, PriceSample};
pub use repositories::{PriceDifferenceRepository, PriceSampleRepository, Repositories};
pub use store::{PriceStore, DEFAULT_MAX_ITEMS};
