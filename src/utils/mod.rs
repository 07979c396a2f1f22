//! Utility functions for the pricing core.
//!
//! - [`conversion`] - Raw on-chain integers to BigDecimal, address helpers,
//!   zero-safe division

mod conversion;

// ============================================
// Common Constants
// ============================================

/// The Ethereum zero address (0x0000000000000000000000000000000000000000)
/// Returned by `getPair` when no pool exists for a token pair.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ============================================
// Re-exports
// ============================================

pub use conversion::{
    bigint_string, hex_encode, normalize_address, reserve_to_decimal, safe_div, u256_to_decimal,
};
