//! Binance USD-M futures integration for quarterly basis capture.
//!
//! - [`BinanceFuturesClient`]: rate-limited REST access (catalog, ticker, candles)
//! - [`SymbolResolver`]: maps a [`basis_core::ContractTier`] to today's symbol
//! - [`PriceFetcher`]: latest price with a tolerant parse
//! - [`candles`]: continuous-contract candle parsing

pub mod candles;
pub mod client;
pub mod error;
pub mod price;
pub mod resolver;
pub mod types;

pub use candles::{parse_candle, parse_candles, ParsedCandles};
pub use client::BinanceFuturesClient;
pub use error::{ExchangeError, Result};
pub use price::{parse_price_body, PriceFetcher};
pub use resolver::{select_symbol, SymbolResolver};
pub use types::{Candle, ExchangeInfo, ResolvedSymbol, SymbolInfo, TickerPrice};

pub use tokio_util::sync::CancellationToken;
