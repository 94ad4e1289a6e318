//! Logical contract tiers.
//!
//! A tier names a position on the delivery curve ("this quarter", "next
//! quarter") independently of the exchange ticker that currently backs it.
//! Each tier maps to a static [`TierSpec`] row; there is no runtime lookup.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Static description of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSpec {
    /// Stable logical code, persisted in the `tier` column.
    pub code: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Exact exchange `contractType` this tier resolves to.
    pub contract_type: &'static str,
    /// Looser substring used when no exact `contractType` match exists.
    pub fallback_pattern: &'static str,
}

const NEAR_QUARTER: TierSpec = TierSpec {
    code: "BTCUSDT_QUARTER",
    description: "BTC/USDT current-quarter delivery contract",
    contract_type: "CURRENT_QUARTER",
    fallback_pattern: "QUARTER",
};

const FAR_QUARTER: TierSpec = TierSpec {
    code: "BTCUSDT_BI-QUARTER",
    description: "BTC/USDT next-quarter delivery contract",
    contract_type: "NEXT_QUARTER",
    fallback_pattern: "QUARTER",
};

/// Logical futures contract designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractTier {
    NearQuarter,
    FarQuarter,
}

impl ContractTier {
    /// All tiers in processing order.
    #[must_use]
    pub fn all() -> Vec<ContractTier> {
        vec![ContractTier::NearQuarter, ContractTier::FarQuarter]
    }

    #[must_use]
    pub fn spec(&self) -> &'static TierSpec {
        match self {
            ContractTier::NearQuarter => &NEAR_QUARTER,
            ContractTier::FarQuarter => &FAR_QUARTER,
        }
    }

    /// Stable code stored alongside samples.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.spec().code
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        self.spec().description
    }

    #[must_use]
    pub fn contract_type(&self) -> &'static str {
        self.spec().contract_type
    }

    #[must_use]
    pub fn fallback_pattern(&self) -> &'static str {
        self.spec().fallback_pattern
    }

    /// Snake-case name used in configuration files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ContractTier::NearQuarter => "near_quarter",
            ContractTier::FarQuarter => "far_quarter",
        }
    }

    /// Looks up a tier by its persisted code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<ContractTier> {
        Self::all().into_iter().find(|tier| tier.code() == code)
    }
}

impl fmt::Display for ContractTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ContractTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ContractTier::all()
            .into_iter()
            .find(|tier| {
                tier.code().eq_ignore_ascii_case(wanted)
                    || tier.name().eq_ignore_ascii_case(wanted)
                    || tier.name().replace('_', "-").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                anyhow!(
                    "Unknown contract tier: '{}'. Valid values: near_quarter, far_quarter, {}, {}",
                    s,
                    NEAR_QUARTER.code,
                    FAR_QUARTER.code
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_ordered_near_then_far() {
        assert_eq!(
            ContractTier::all(),
            vec![ContractTier::NearQuarter, ContractTier::FarQuarter]
        );
    }

    #[test]
    fn test_spec_table() {
        assert_eq!(ContractTier::NearQuarter.code(), "BTCUSDT_QUARTER");
        assert_eq!(ContractTier::NearQuarter.contract_type(), "CURRENT_QUARTER");
        assert_eq!(ContractTier::FarQuarter.code(), "BTCUSDT_BI-QUARTER");
        assert_eq!(ContractTier::FarQuarter.contract_type(), "NEXT_QUARTER");
        assert_eq!(ContractTier::FarQuarter.fallback_pattern(), "QUARTER");
    }

    #[test]
    fn test_codes_are_unique() {
        let tiers = ContractTier::all();
        for (i, a) in tiers.iter().enumerate() {
            for b in &tiers[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_from_str_accepts_code_and_names() {
        assert_eq!(
            ContractTier::from_str("BTCUSDT_QUARTER").unwrap(),
            ContractTier::NearQuarter
        );
        assert_eq!(
            ContractTier::from_str("btcusdt_bi-quarter").unwrap(),
            ContractTier::FarQuarter
        );
        assert_eq!(
            ContractTier::from_str("near_quarter").unwrap(),
            ContractTier::NearQuarter
        );
        assert_eq!(
            ContractTier::from_str("far-quarter").unwrap(),
            ContractTier::FarQuarter
        );
    }

    #[test]
    fn test_from_str_invalid() {
        let err = ContractTier::from_str("perpetual").unwrap_err();
        assert!(err.to_string().contains("Unknown contract tier"));
    }

    #[test]
    fn test_from_code_roundtrip() {
        for tier in ContractTier::all() {
            assert_eq!(ContractTier::from_code(tier.code()), Some(tier));
        }
        assert_eq!(ContractTier::from_code("near_quarter"), None);
    }

    #[test]
    fn test_display_prints_code() {
        assert_eq!(ContractTier::FarQuarter.to_string(), "BTCUSDT_BI-QUARTER");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ContractTier::NearQuarter).unwrap();
        assert_eq!(json, "\"near_quarter\"");
        let tier: ContractTier = serde_json::from_str("\"far_quarter\"").unwrap();
        assert_eq!(tier, ContractTier::FarQuarter);
    }
}
