//! Persisted models.

pub mod price_difference;
pub mod price_sample;

pub use price_difference::{DifferenceKey, PriceDifference, PriceDifferenceRow};
pub use price_sample::{PriceSample, PriceSampleRow};
