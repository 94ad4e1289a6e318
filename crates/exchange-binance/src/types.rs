//! Exchange payloads and resolved identifiers.

use basis_core::ContractTier;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `GET /fapi/v1/exchangeInfo` response; only the symbol list is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

/// One catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub pair: String,
    /// `PERPETUAL`, `CURRENT_QUARTER`, `NEXT_QUARTER`, or empty for spot-like entries.
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub base_asset: String,
    #[serde(default)]
    pub quote_asset: String,
    #[serde(default)]
    pub status: String,
}

impl SymbolInfo {
    /// `"SYMBOL (CONTRACT_TYPE)"`, as reported in resolution errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.symbol, self.contract_type)
    }
}

/// Exchange-native symbol currently backing a tier.
///
/// Valid for one fetch cycle only; contracts rotate at expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSymbol {
    pub tier: ContractTier,
    pub symbol: String,
    pub contract_type: String,
    /// True when only the looser fallback pattern matched.
    pub used_fallback: bool,
}

/// `GET /fapi/v1/ticker/price` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
    #[serde(default)]
    pub time: Option<i64>,
}

/// The two candle fields the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_info_deserialize() {
        let json = r#"{
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "pair": "BTCUSDT", "contractType": "PERPETUAL",
                 "baseAsset": "BTC", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "BTCUSDT_250627", "pair": "BTCUSDT", "contractType": "CURRENT_QUARTER",
                 "baseAsset": "BTC", "quoteAsset": "USDT", "status": "TRADING"}
            ]
        }"#;

        let info: ExchangeInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.symbols.len(), 2);
        assert_eq!(info.symbols[1].contract_type, "CURRENT_QUARTER");
        assert_eq!(info.symbols[1].label(), "BTCUSDT_250627 (CURRENT_QUARTER)");
    }

    #[test]
    fn test_symbol_missing_contract_type_defaults_empty() {
        let info: SymbolInfo =
            serde_json::from_str(r#"{"symbol": "BTCUSDT", "baseAsset": "BTC"}"#).unwrap();
        assert!(info.contract_type.is_empty());
        assert!(info.quote_asset.is_empty());
    }
}
