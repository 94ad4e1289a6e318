#![allow(dead_code)]

use std::sync::Arc;

use basis_binance::client::{CONTINUOUS_KLINES_PATH, EXCHANGE_INFO_PATH, TICKER_PRICE_PATH};
use basis_binance::BinanceFuturesClient;
use basis_core::AppConfig;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NEAR_SYMBOL: &str = "BTCUSDT_250627";
pub const FAR_SYMBOL: &str = "BTCUSDT_250926";

pub fn test_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.exchange.base_url = server.uri();
    config.exchange.requests_per_second = 1000;
    config
}

pub fn test_client(config: &AppConfig) -> Arc<BinanceFuturesClient> {
    Arc::new(BinanceFuturesClient::new(&config.exchange).unwrap())
}

pub fn catalog_entry(symbol: &str, contract_type: &str) -> Value {
    json!({
        "symbol": symbol,
        "pair": "BTCUSDT",
        "contractType": contract_type,
        "baseAsset": "BTC",
        "quoteAsset": "USDT",
        "status": "TRADING"
    })
}

/// Catalog with a perpetual plus both quarterlies.
pub fn quarterly_catalog() -> Vec<Value> {
    vec![
        catalog_entry("BTCUSDT", "PERPETUAL"),
        catalog_entry(NEAR_SYMBOL, "CURRENT_QUARTER"),
        catalog_entry(FAR_SYMBOL, "NEXT_QUARTER"),
    ]
}

pub async fn mount_catalog(server: &MockServer, entries: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(EXCHANGE_INFO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "UTC",
            "symbols": entries
        })))
        .mount(server)
        .await;
}

pub async fn mount_ticker(server: &MockServer, symbol: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(TICKER_PRICE_PATH))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": symbol,
            "price": price,
            "time": 1743332400000_i64
        })))
        .mount(server)
        .await;
}

pub async fn mount_ticker_body(server: &MockServer, symbol: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(TICKER_PRICE_PATH))
        .and(query_param("symbol", symbol))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A candle row with only open time and close meaningful.
pub fn kline(open_time: DateTime<Utc>, close: &str) -> Value {
    json!([
        open_time.timestamp_millis(),
        "0", "0", "0",
        close,
        "1.0",
        open_time.timestamp_millis() + 3_599_999
    ])
}

pub async fn mount_klines(
    server: &MockServer,
    contract_type: &str,
    window_start: DateTime<Utc>,
    rows: Vec<Value>,
) {
    Mock::given(method("GET"))
        .and(path(CONTINUOUS_KLINES_PATH))
        .and(query_param("contractType", contract_type))
        .and(query_param("startTime", window_start.timestamp_millis().to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(rows)))
        .mount(server)
        .await;
}

pub async fn mount_klines_failure(
    server: &MockServer,
    contract_type: &str,
    window_start: DateTime<Utc>,
) {
    Mock::given(method("GET"))
        .and(path(CONTINUOUS_KLINES_PATH))
        .and(query_param("contractType", contract_type))
        .and(query_param("startTime", window_start.timestamp_millis().to_string()))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(server)
        .await;
}
