use ethers::core::types::Address;
use ethers::utils::to_checksum;
use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::error::ValidationError;

lazy_static! {
    static ref ADDRESS_PATTERN: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
}

pub fn validate_ethereum_address(address: &str) -> bool {
    ADDRESS_PATTERN.is_match(address)
}

/// Parses a `0x`-prefixed 20-byte hex address. Letter case is not checked.
pub fn parse_address(address: &str) -> Result<Address, ValidationError> {
    let trimmed = address.trim();
    if !validate_ethereum_address(trimmed) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    trimmed
        .parse::<Address>()
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))
}

/// EIP-55 checksum form.
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ethereum_address() {
        // Valid addresses
        assert!(validate_ethereum_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6"));
        assert!(validate_ethereum_address("0x0000000000000000000000000000000000000000"));

        // Invalid addresses
        assert!(!validate_ethereum_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b")); // Too short
        assert!(!validate_ethereum_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8bG")); // Invalid character
        assert!(!validate_ethereum_address("742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6")); // No prefix
        assert!(!validate_ethereum_address(""));
    }

    #[test]
    fn test_parse_address_normalizes_case() {
        let lower = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let mixed = parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(checksum(&lower), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_parse_address_trims_whitespace() {
        assert!(parse_address("  0x0000000000000000000000000000000000000000 ").is_ok());
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        for bad in ["", "0x", "hello", "0x51f1774249Fc2B0C2603542Ac6184Ae1d04835", "0xZZf1774249Fc2B0C2603542Ac6184Ae1d048351d"] {
            match parse_address(bad) {
                Err(ValidationError::InvalidAddress(value)) => assert_eq!(value, bad),
                other => panic!("expected InvalidAddress for {bad:?}, got {other:?}"),
            }
        }
    }
}
