use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Fixed identity of the singleton bundle.
pub const BUNDLE_ID: &str = "1";

/// Global native coin price (singleton).
///
/// Holds the USD price of the wrapped native token derived from the
/// configured stable pools. Every tracked USD figure is
/// `derived_native * native_price_usd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub native_price_usd: BigDecimal,
}

impl Bundle {
    pub fn new(native_price_usd: BigDecimal) -> Self {
        Self {
            id: BUNDLE_ID.to_string(),
            native_price_usd,
        }
    }
}

impl Default for Bundle {
    fn default() -> Self {
        Self::new(BigDecimal::zero())
    }
}
