pub mod bucket;
pub mod config;
pub mod config_loader;
pub mod tier;

pub use bucket::{checked_days, checked_hours, truncate_to_hour, TimeRange};
pub use config::{
    AppConfig, CollectionConfig, DatabaseConfig, ExchangeConfig, MAX_BACKFILL_DAYS,
    MAX_BACKFILL_WINDOW_DAYS, MAX_CANDLES_PER_REQUEST, MAX_SPREAD_LOOKBACK_HOURS,
};
pub use config_loader::ConfigLoader;
pub use tier::{ContractTier, TierSpec};
