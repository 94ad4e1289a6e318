//! Binance USD-M futures REST client with rate limiting.
//!
//! One instance is built from [`ExchangeConfig`] and shared behind an `Arc`;
//! every call takes `&self` and a [`CancellationToken`].

use crate::error::{ExchangeError, Result};
use crate::types::ExchangeInfo;
use basis_core::{ExchangeConfig, MAX_CANDLES_PER_REQUEST};
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const EXCHANGE_INFO_PATH: &str = "/fapi/v1/exchangeInfo";
pub const TICKER_PRICE_PATH: &str = "/fapi/v1/ticker/price";
pub const CONTINUOUS_KLINES_PATH: &str = "/fapi/v1/continuousKlines";

/// Maximum candles the exchange returns per call.
pub const KLINE_LIMIT: u32 = MAX_CANDLES_PER_REQUEST;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// REST client for the futures market-data endpoints.
pub struct BinanceFuturesClient {
    base_url: String,
    http: Client,
    rate_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for BinanceFuturesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceFuturesClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BinanceFuturesClient {
    /// Creates a client from exchange configuration.
    ///
    /// # Errors
    /// Returns an error if the rate is zero or the HTTP client cannot be built.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            ExchangeError::Config("requests_per_second must be greater than zero".to_string())
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the symbol catalog.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, decode failure
    /// or cancellation.
    pub async fn get_exchange_info(&self, cancel: &CancellationToken) -> Result<ExchangeInfo> {
        let body = self.get_text(EXCHANGE_INFO_PATH, &[], cancel).await?;
        decode(&body)
    }

    /// Fetches the raw ticker-price body for a symbol.
    ///
    /// The body is returned unparsed so callers can fall back to a loose
    /// field lookup when the typed shape changes.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status or cancellation.
    pub async fn get_ticker_price_body(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.get_text(TICKER_PRICE_PATH, &[("symbol", symbol.to_string())], cancel)
            .await
    }

    /// Fetches hourly continuous-contract candles for `[start, end]`.
    ///
    /// Rows are returned as raw JSON arrays; see [`crate::candles`].
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, decode failure
    /// or cancellation.
    pub async fn get_continuous_klines(
        &self,
        pair: &str,
        contract_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>> {
        let query = [
            ("pair", pair.to_string()),
            ("contractType", contract_type.to_string()),
            ("interval", "1h".to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("endTime", end.timestamp_millis().to_string()),
            ("limit", KLINE_LIMIT.to_string()),
        ];
        let body = self.get_text(CONTINUOUS_KLINES_PATH, &query, cancel).await?;
        decode(&body)
    }

    /// Waits for the rate limiter and performs a GET, racing cancellation.
    async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<String> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ExchangeError::Cancelled),
            result = self.send(path, query) => result,
        }
    }

    async fn send(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExchangeError::api(status.as_u16(), text));
        }

        Ok(response.text().await?)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ExchangeConfig {
        ExchangeConfig {
            base_url: server.uri(),
            requests_per_second: 50,
            ..ExchangeConfig::default()
        }
    }

    #[test]
    fn test_zero_rate_rejected() {
        let config = ExchangeConfig {
            requests_per_second: 0,
            ..ExchangeConfig::default()
        };
        let err = BinanceFuturesClient::new(&config).unwrap_err();
        assert!(matches!(err, ExchangeError::Config(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ExchangeConfig {
            base_url: "https://fapi.binance.com/".to_string(),
            ..ExchangeConfig::default()
        };
        let client = BinanceFuturesClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://fapi.binance.com");
    }

    #[tokio::test]
    async fn test_get_exchange_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EXCHANGE_INFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"symbols":[{"symbol":"BTCUSDT_250627","contractType":"CURRENT_QUARTER",
                    "baseAsset":"BTC","quoteAsset":"USDT"}]}"#,
            ))
            .mount(&server)
            .await;

        let client = BinanceFuturesClient::new(&config_for(&server)).unwrap();
        let info = client
            .get_exchange_info(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(info.symbols.len(), 1);
        assert_eq!(info.symbols[0].symbol, "BTCUSDT_250627");
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TICKER_PRICE_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
            )
            .mount(&server)
            .await;

        let client = BinanceFuturesClient::new(&config_for(&server)).unwrap();
        let err = client
            .get_ticker_price_body("NOPE", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Api { status: 400, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_continuous_klines_query() {
        let server = MockServer::start().await;
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap();

        Mock::given(method("GET"))
            .and(path(CONTINUOUS_KLINES_PATH))
            .and(query_param("pair", "BTCUSDT"))
            .and(query_param("contractType", "NEXT_QUARTER"))
            .and(query_param("interval", "1h"))
            .and(query_param("startTime", start.timestamp_millis().to_string()))
            .and(query_param("endTime", end.timestamp_millis().to_string()))
            .and(query_param("limit", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[[1740787200000,"86000.0","86100.0","85900.0","86050.5","12.5",1740790799999]]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = BinanceFuturesClient::new(&config_for(&server)).unwrap();
        let rows = client
            .get_continuous_klines("BTCUSDT", "NEXT_QUARTER", start, end, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let client = BinanceFuturesClient::new(&config_for(&server)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.get_exchange_info(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
