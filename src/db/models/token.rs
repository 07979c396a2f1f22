use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::utils::normalize_address;

/// Token metadata and derived pricing state.
///
/// Primary Key: address
/// Query Pattern: "Get token info for address X"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    // Primary key
    pub address: String,

    // On-chain metadata (immutable after first fetch)
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,

    /// Price of one unit of this token in wrapped native units.
    /// Zero means the token is currently unpriced.
    #[serde(default = "BigDecimal::zero")]
    pub derived_native: BigDecimal,
}

impl Token {
    /// Constructor for just metadata (price starts unresolved)
    pub fn new(address: &str, symbol: String, decimals: u8) -> Self {
        Self {
            // Always lowercase addresses for consistent comparisons
            address: normalize_address(address),
            symbol,
            decimals,
            derived_native: BigDecimal::zero(),
        }
    }

    pub fn is_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}
