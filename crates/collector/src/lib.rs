//! Quarterly futures basis collection.
//!
//! - [`HistoricalBackfiller`]: chunked candle backfill into hourly samples
//! - [`LiveCollector`]: current-hour samples for each tier
//! - [`SpreadCalculator`]: per-hour spread between two tiers
//! - [`CollectionOrchestrator`]: the live and historical flows

pub mod backfill;
pub mod live;
pub mod orchestrator;
pub mod spread;

pub use backfill::{aggregate_hourly, BackfillStats, HistoricalBackfiller};
pub use live::{LiveCollector, LiveReport};
pub use orchestrator::{CollectionOrchestrator, Flow, FlowReport};
pub use spread::{compute_spreads, SpreadCalculator};
