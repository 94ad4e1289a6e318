//! Latest-price fetching with a tolerant body parse.

use crate::candles::{decimal_from_json, parse_decimal};
use crate::client::BinanceFuturesClient;
use crate::error::{ExchangeError, Result};
use crate::types::{ResolvedSymbol, TickerPrice};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Extracts the price from a ticker body.
///
/// Tries the typed `{symbol, price, time}` shape first, then looks up a raw
/// `price` field (on the object, or on the matching element of an array).
#[must_use]
pub fn parse_price_body(symbol: &str, body: &str) -> Option<Decimal> {
    if let Ok(ticker) = serde_json::from_str::<TickerPrice>(body) {
        if let Some(price) = parse_decimal(&ticker.price) {
            return Some(price);
        }
    }

    let value: Value = serde_json::from_str(body).ok()?;
    match &value {
        Value::Object(_) => value.get("price").and_then(decimal_from_json),
        Value::Array(entries) => entries
            .iter()
            .find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol))
            .and_then(|e| e.get("price"))
            .and_then(decimal_from_json),
        _ => None,
    }
}

/// Fetches the instantaneous price of a resolved symbol.
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    client: Arc<BinanceFuturesClient>,
}

impl PriceFetcher {
    #[must_use]
    pub fn new(client: Arc<BinanceFuturesClient>) -> Self {
        Self { client }
    }

    /// Returns the latest traded price for `symbol`.
    ///
    /// # Errors
    /// Returns `PriceUnavailable` if neither parse path yields a decimal, or
    /// the underlying request error.
    pub async fn fetch_latest(
        &self,
        symbol: &ResolvedSymbol,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let body = self
            .client
            .get_ticker_price_body(&symbol.symbol, cancel)
            .await?;

        parse_price_body(&symbol.symbol, &body)
            .ok_or_else(|| ExchangeError::price_unavailable(&symbol.symbol, truncate(&body, 256)))
    }
}

fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_typed_shape() {
        let body = r#"{"symbol":"BTCUSDT_250627","price":"84250.10","time":1743332400000}"#;
        assert_eq!(parse_price_body("BTCUSDT_250627", body), Some(dec!(84250.10)));
    }

    #[test]
    fn test_numeric_price_falls_back_to_raw_field() {
        let body = r#"{"symbol":"BTCUSDT_250627","price":84250.1}"#;
        assert_eq!(parse_price_body("BTCUSDT_250627", body), Some(dec!(84250.1)));
    }

    #[test]
    fn test_missing_symbol_falls_back_to_raw_field() {
        let body = r#"{"price":"84250.10"}"#;
        assert_eq!(parse_price_body("BTCUSDT_250627", body), Some(dec!(84250.10)));
    }

    #[test]
    fn test_array_shape_matches_symbol() {
        let body = r#"[{"symbol":"BTCUSDT","price":"84000"},{"symbol":"BTCUSDT_250627","price":"84250.10"}]"#;
        assert_eq!(parse_price_body("BTCUSDT_250627", body), Some(dec!(84250.10)));
    }

    #[test]
    fn test_unparseable_body() {
        assert_eq!(parse_price_body("X", r#"{"price":"n/a"}"#), None);
        assert_eq!(parse_price_body("X", "<html>busy</html>"), None);
        assert_eq!(parse_price_body("X", r#"{"code":-1121}"#), None);
    }
}
