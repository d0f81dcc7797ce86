use ethers::types::U256;
use ethers::utils::format_units;
use serde::{Serialize, Serializer};

use crate::domain::error::{BlockchainError, TrackerResult};

/// Balance of one holder, both raw and decimal-adjusted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceQueryResult {
    pub address: String,
    pub balance: f64,
    #[serde(serialize_with = "serialize_raw_amount")]
    pub raw: U256,
    pub decimals: u8,
}

impl BalanceQueryResult {
    pub fn new(address: String, raw: U256, decimals: u8) -> TrackerResult<Self> {
        Ok(Self {
            address,
            balance: to_token_amount(raw, decimals)?,
            raw,
            decimals,
        })
    }
}

/// Token metadata as reported by the contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(rename = "totalSupply", serialize_with = "serialize_raw_amount")]
    pub total_supply: U256,
    #[serde(rename = "totalSupply_tokens")]
    pub total_supply_tokens: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatestBlock {
    pub block_number: u64,
}

/// Newest ERC-20 transfer touching an address. Both fields are `None` when no
/// transfer falls inside the scanned block window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastTransaction {
    pub address: String,
    pub block_number: Option<u64>,
    /// RFC 3339, UTC.
    pub timestamp: Option<String>,
}

/// Converts a raw on-chain amount into token units (`raw / 10^decimals`).
pub fn to_token_amount(raw: U256, decimals: u8) -> TrackerResult<f64> {
    let formatted = format_units(raw, decimals as u32).map_err(|e| {
        BlockchainError::ContractCallFailure(format!("Unsupported decimals {decimals}: {e}"))
    })?;

    formatted.parse::<f64>().map_err(|e| {
        BlockchainError::ContractCallFailure(format!("Cannot convert amount {formatted}: {e}")).into()
    })
}

/// Raw amounts go out as JSON integers; values past `u128` fall back to a decimal string.
pub fn serialize_raw_amount<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    if *value <= U256::from(u128::MAX) {
        serializer.serialize_u128(value.as_u128())
    } else {
        serializer.serialize_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eighteen_decimals() {
        let raw = U256::from_dec_str("1500000000000000000").unwrap();
        assert_eq!(to_token_amount(raw, 18).unwrap(), 1.5);
    }

    #[test]
    fn test_zero_balance() {
        let result = BalanceQueryResult::new("0x0".to_string(), U256::zero(), 6).unwrap();
        assert_eq!(result.raw, U256::zero());
        assert_eq!(result.balance, 0.0);
    }

    #[test]
    fn test_zero_decimals_is_identity() {
        assert_eq!(to_token_amount(U256::from(42u64), 0).unwrap(), 42.0);
    }

    #[test]
    fn test_amount_matches_division() {
        let samples: [(u128, u8); 4] = [
            (1, 18),
            (123_456_789, 6),
            (999_999_999_999_999_999, 18),
            (25_000_000_000, 8),
        ];
        for (raw, decimals) in samples {
            let expected = raw as f64 / 10f64.powi(decimals as i32);
            let actual = to_token_amount(U256::from(raw), decimals).unwrap();
            assert!((actual - expected).abs() <= expected * 1e-12, "{raw} / 10^{decimals}");
        }
    }

    #[test]
    fn test_absurd_decimals_are_rejected() {
        assert!(to_token_amount(U256::one(), 200).is_err());
    }

    #[test]
    fn test_raw_amount_serialization() {
        let result = BalanceQueryResult::new(
            "0x51f1774249Fc2B0C2603542Ac6184Ae1d048351d".to_string(),
            U256::from_dec_str("1500000000000000000").unwrap(),
            18,
        )
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["raw"], serde_json::json!(1500000000000000000u64));
        assert_eq!(json["balance"], serde_json::json!(1.5));
        assert_eq!(json["decimals"], serde_json::json!(18));

        let huge = TokenInfo {
            address: "0x0".to_string(),
            name: "Huge".to_string(),
            symbol: "HUGE".to_string(),
            decimals: 0,
            total_supply: U256::MAX,
            total_supply_tokens: 0.0,
        };
        let json = serde_json::to_value(&huge).unwrap();
        assert_eq!(json["totalSupply"], serde_json::json!(U256::MAX.to_string()));
        assert!(json.get("totalSupply_tokens").is_some());
    }
}
