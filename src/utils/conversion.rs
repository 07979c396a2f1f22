//! Type conversion and formatting utilities.
//!
//! Functions for converting raw on-chain integers (u128, U256) into
//! arbitrary-precision decimals, plus address normalization helpers.

use alloy::primitives::{hex, U256};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;
use once_cell::sync::Lazy;

// ============================================
// Hex Encoding
// ============================================

/// Encode bytes as a lowercase hex string with 0x prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Normalize an address string for map keys and comparisons.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

// ============================================
// Raw Amount Conversions
// ============================================

/// Convert a u128 reserve value to a decimal-adjusted BigDecimal.
///
/// V2 `Sync` reserves are `uint112`, so they always fit in a u128.
pub fn reserve_to_decimal(reserve: u128, decimals: u8) -> BigDecimal {
    let value = BigDecimal::from(reserve);

    if decimals == 0 {
        value
    } else {
        value / big_pow10(decimals)
    }
}

/// Convert U256 to a decimal-adjusted BigDecimal without going through f64.
///
/// # Example
/// ```ignore
/// let value = U256::from(1_500_000_000_000_000_000u128); // 1.5e18
/// let adjusted = u256_to_decimal(value, 18); // 1.5
/// ```
pub fn u256_to_decimal(value: U256, decimals: u8) -> BigDecimal {
    let bytes: [u8; 32] = value.to_le_bytes();
    let big_int = BigInt::from_bytes_le(num_bigint::Sign::Plus, &bytes);
    let big_value = BigDecimal::from(big_int);

    if decimals == 0 {
        big_value
    } else {
        big_value / big_pow10(decimals)
    }
}

// ============================================
// Decimal Arithmetic
// ============================================

/// Divide two decimals, returning zero when the denominator is zero.
///
/// BigDecimal panics on division by zero, so every ratio computed from
/// reserves goes through here.
pub fn safe_div(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        BigDecimal::zero()
    } else {
        numerator / denominator
    }
}

// ============================================
// Serde Helpers
// ============================================

/// Serialize a BigInt as a decimal string (JSON snapshots stay human-readable).
pub mod bigint_string {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigInt::from_str(raw.trim()).map_err(D::Error::custom)
    }
}

// ============================================
// Internal Helpers
// ============================================

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

/// Compute 10^exp as BigDecimal.
pub(crate) fn big_pow10(exp: u8) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_reserve_to_decimal_scales_by_decimals() {
        let adjusted = reserve_to_decimal(1_500_000_000_000_000_000, 18);
        assert_eq!(adjusted, BigDecimal::from_str("1.5").unwrap());

        let usdc = reserve_to_decimal(2_500_000, 6);
        assert_eq!(usdc, BigDecimal::from_str("2.5").unwrap());
    }

    #[test]
    fn test_u256_to_decimal_keeps_full_precision() {
        // 2^100 is far beyond f64's exact integer range
        let value = U256::from(1u8) << 100usize;
        let adjusted = u256_to_decimal(value, 0);
        assert_eq!(
            adjusted,
            BigDecimal::from_str("1267650600228229401496703205376").unwrap()
        );
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        let ten = BigDecimal::from(10);
        assert_eq!(safe_div(&ten, &BigDecimal::zero()), BigDecimal::zero());
        assert_eq!(safe_div(&ten, &BigDecimal::from(4)), BigDecimal::from_str("2.5").unwrap());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address(" 0x4446Fc4eb47f2f6586f9fAAb68B3498F86C07521 "),
            "0x4446fc4eb47f2f6586f9faab68b3498f86c07521"
        );
    }
}
