//! Error types for the futures exchange integration.

use basis_core::ContractTier;
use thiserror::Error;

/// Errors raised while talking to the exchange or interpreting its responses.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// No catalog entry matches the tier, even through the fallback pattern.
    #[error("no symbol for tier {tier}; available: [{}]", .available.join(", "))]
    Resolution {
        tier: ContractTier,
        /// `"SYMBOL (CONTRACT_TYPE)"` entries that were eligible.
        available: Vec<String>,
    },

    /// The catalog holds no delivery contracts for the configured assets.
    #[error("catalog has no delivery contracts for {base}/{quote}")]
    EmptyCatalog { base: String, quote: String },

    /// Neither the typed nor the raw parse yielded a price.
    #[error("price unavailable for {symbol}: {body}")]
    PriceUnavailable { symbol: String, body: String },

    /// A candle row could not be interpreted.
    #[error("malformed candle: {0}")]
    CandleParse(String),

    /// Non-2xx response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Transport, timeout or body decoding failure.
    #[error("network error: {0}")]
    Network(String),

    /// Client settings that can never produce a working request.
    #[error("invalid exchange configuration: {0}")]
    Config(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ExchangeError {
    pub fn resolution(tier: ContractTier, available: Vec<String>) -> Self {
        Self::Resolution { tier, available }
    }

    pub fn empty_catalog(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self::EmptyCatalog {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn price_unavailable(symbol: impl Into<String>, body: impl Into<String>) -> Self {
        Self::PriceUnavailable {
            symbol: symbol.into(),
            body: body.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Returns true for failures a later trigger may not see again.
    ///
    /// There is no retry loop; the next scheduled run is the retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Network(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Network(format!("failed to decode response: {err}"))
    }
}

/// Result type alias for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
