//! Shows today's exchange symbol for each tier.

use std::sync::Arc;

use anyhow::{Context, Result};
use basis_binance::{BinanceFuturesClient, SymbolResolver};
use basis_core::AppConfig;
use clap::Args;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::print_json;

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone, Default)]
pub struct ResolveArgs {}

/// Resolves every configured tier from one catalog fetch.
///
/// # Errors
/// Returns an error if the catalog cannot be fetched. Per-tier resolution
/// failures are printed, not returned.
pub async fn run_resolve(config: AppConfig, _args: ResolveArgs) -> Result<()> {
    let client = Arc::new(
        BinanceFuturesClient::new(&config.exchange).context("Failed to build exchange client")?,
    );
    let resolver = SymbolResolver::new(client, &config.exchange);

    let resolved = resolver
        .resolve_all(&config.collection.tiers, &CancellationToken::new())
        .await
        .context("Failed to fetch exchange catalog")?;

    let rows: Vec<Value> = resolved
        .into_iter()
        .map(|(tier, result)| match result {
            Ok(symbol) => json!({
                "tier": tier.code(),
                "symbol": symbol.symbol,
                "contract_type": symbol.contract_type,
                "used_fallback": symbol.used_fallback,
            }),
            Err(e) => json!({
                "tier": tier.code(),
                "error": e.to_string(),
            }),
        })
        .collect();

    print_json(&rows)
}
