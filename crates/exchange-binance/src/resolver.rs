//! Tier to exchange-symbol resolution.

use crate::client::BinanceFuturesClient;
use crate::error::{ExchangeError, Result};
use crate::types::{ResolvedSymbol, SymbolInfo};
use basis_core::{ContractTier, ExchangeConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Picks the catalog entry for `tier`.
///
/// Eligible entries match `base`/`quote` and carry a non-empty contract type.
/// An exact case-insensitive contract-type match wins; otherwise the first
/// entry whose contract type contains the tier's fallback pattern is used.
///
/// # Errors
/// `EmptyCatalog` if nothing is eligible, `Resolution` if nothing matches.
pub fn select_symbol(
    catalog: &[SymbolInfo],
    tier: ContractTier,
    base: &str,
    quote: &str,
) -> Result<ResolvedSymbol> {
    let eligible: Vec<&SymbolInfo> = catalog
        .iter()
        .filter(|s| {
            s.base_asset.eq_ignore_ascii_case(base)
                && s.quote_asset.eq_ignore_ascii_case(quote)
                && !s.contract_type.trim().is_empty()
        })
        .collect();

    if eligible.is_empty() {
        return Err(ExchangeError::empty_catalog(base, quote));
    }

    if let Some(exact) = eligible
        .iter()
        .find(|s| s.contract_type.eq_ignore_ascii_case(tier.contract_type()))
    {
        return Ok(ResolvedSymbol {
            tier,
            symbol: exact.symbol.clone(),
            contract_type: exact.contract_type.clone(),
            used_fallback: false,
        });
    }

    let pattern = tier.fallback_pattern().to_ascii_uppercase();
    if let Some(loose) = eligible
        .iter()
        .find(|s| s.contract_type.to_ascii_uppercase().contains(&pattern))
    {
        warn!(
            tier = %tier,
            wanted = tier.contract_type(),
            symbol = %loose.symbol,
            contract_type = %loose.contract_type,
            "No exact contract type match, using fallback"
        );
        return Ok(ResolvedSymbol {
            tier,
            symbol: loose.symbol.clone(),
            contract_type: loose.contract_type.clone(),
            used_fallback: true,
        });
    }

    Err(ExchangeError::resolution(
        tier,
        eligible.iter().map(|s| s.label()).collect(),
    ))
}

/// Resolves tiers against the live catalog.
///
/// The catalog is fetched on every call; contracts rotate at expiry.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    client: Arc<BinanceFuturesClient>,
    base_asset: String,
    quote_asset: String,
}

impl SymbolResolver {
    #[must_use]
    pub fn new(client: Arc<BinanceFuturesClient>, config: &ExchangeConfig) -> Self {
        Self {
            client,
            base_asset: config.base_asset.clone(),
            quote_asset: config.quote_asset.clone(),
        }
    }

    /// Resolves one tier.
    ///
    /// # Errors
    /// Returns the catalog request error, `EmptyCatalog` or `Resolution`.
    pub async fn resolve(
        &self,
        tier: ContractTier,
        cancel: &CancellationToken,
    ) -> Result<ResolvedSymbol> {
        let info = self.client.get_exchange_info(cancel).await?;
        let resolved = select_symbol(&info.symbols, tier, &self.base_asset, &self.quote_asset)?;
        debug!(tier = %tier, symbol = %resolved.symbol, "Resolved symbol");
        Ok(resolved)
    }

    /// Resolves several tiers from a single catalog fetch.
    ///
    /// # Errors
    /// Returns an error only if the catalog request itself fails; per-tier
    /// resolution failures are returned alongside their tier.
    pub async fn resolve_all(
        &self,
        tiers: &[ContractTier],
        cancel: &CancellationToken,
    ) -> Result<Vec<(ContractTier, Result<ResolvedSymbol>)>> {
        let info = self.client.get_exchange_info(cancel).await?;
        Ok(tiers
            .iter()
            .map(|&tier| {
                (
                    tier,
                    select_symbol(&info.symbols, tier, &self.base_asset, &self.quote_asset),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, contract_type: &str) -> SymbolInfo {
        SymbolInfo {
            symbol: symbol.to_string(),
            pair: "BTCUSDT".to_string(),
            contract_type: contract_type.to_string(),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            status: "TRADING".to_string(),
        }
    }

    fn catalog() -> Vec<SymbolInfo> {
        vec![
            entry("BTCUSDT", "PERPETUAL"),
            entry("BTCUSDT_250627", "CURRENT_QUARTER"),
            entry("BTCUSDT_250926", "NEXT_QUARTER"),
            SymbolInfo {
                base_asset: "ETH".to_string(),
                ..entry("ETHUSDT_250627", "CURRENT_QUARTER")
            },
        ]
    }

    #[test]
    fn test_exact_match() {
        let near = select_symbol(&catalog(), ContractTier::NearQuarter, "BTC", "USDT").unwrap();
        assert_eq!(near.symbol, "BTCUSDT_250627");
        assert!(!near.used_fallback);

        let far = select_symbol(&catalog(), ContractTier::FarQuarter, "BTC", "USDT").unwrap();
        assert_eq!(far.symbol, "BTCUSDT_250926");
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let catalog = vec![entry("BTCUSDT_250627", "current_quarter")];
        let near = select_symbol(&catalog, ContractTier::NearQuarter, "BTC", "USDT").unwrap();
        assert!(!near.used_fallback);
    }

    #[test]
    fn test_fallback_pattern() {
        let catalog = vec![
            entry("BTCUSDT", "PERPETUAL"),
            entry("BTCUSDT_250627", "CURRENT_QUARTER_DELIVERING"),
        ];

        let far = select_symbol(&catalog, ContractTier::FarQuarter, "BTC", "USDT").unwrap();
        assert_eq!(far.symbol, "BTCUSDT_250627");
        assert!(far.used_fallback);
    }

    #[test]
    fn test_no_match_lists_available() {
        let catalog = vec![entry("BTCUSDT", "PERPETUAL")];

        let err = select_symbol(&catalog, ContractTier::NearQuarter, "BTC", "USDT").unwrap_err();
        match err {
            ExchangeError::Resolution { tier, available } => {
                assert_eq!(tier, ContractTier::NearQuarter);
                assert_eq!(available, vec!["BTCUSDT (PERPETUAL)".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_contract_types_are_ineligible() {
        let catalog = vec![entry("BTCUSDT", ""), entry("BTCUSDT_X", "  ")];
        let err = select_symbol(&catalog, ContractTier::NearQuarter, "BTC", "USDT").unwrap_err();
        assert!(matches!(err, ExchangeError::EmptyCatalog { .. }));
    }

    #[test]
    fn test_other_assets_ignored() {
        let err = select_symbol(&catalog(), ContractTier::NearQuarter, "SOL", "USDT").unwrap_err();
        assert!(matches!(err, ExchangeError::EmptyCatalog { .. }));
    }
}
