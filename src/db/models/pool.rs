use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
    abis::v2,
    db::models::Token,
    utils::{bigint_string, hex_encode, normalize_address, reserve_to_decimal, safe_div},
};

/// Which side of a pool a token sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSide {
    Token0,
    Token1,
}

/// Constant-product pool state.
///
/// Primary Key: address
/// Query Pattern: "Get pool info for address X"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    // Primary key
    pub address: String,

    // Token pair metadata (denormalized)
    pub token0: String,
    pub token1: String,
    #[serde(default)]
    pub token0_decimals: u8,
    #[serde(default)]
    pub token1_decimals: u8,

    // Reserves (decimal-adjusted)
    #[serde(default = "BigDecimal::zero")]
    pub reserve0: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub reserve1: BigDecimal,

    // Computed prices (Uniswap style)
    // token0_price = token0 per token1 (reserve0 / reserve1)
    // token1_price = token1 per token0 (reserve1 / reserve0)
    #[serde(default = "BigDecimal::zero")]
    pub token0_price: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub token1_price: BigDecimal,

    // Pool value in wrapped native units
    #[serde(default = "BigDecimal::zero")]
    pub reserve_native: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub tracked_reserve_native: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub reserve_usd: BigDecimal,

    #[serde(default, with = "bigint_string")]
    pub liquidity_provider_count: BigInt,

    // Lifetime stats
    #[serde(default = "BigDecimal::zero")]
    pub volume_usd: BigDecimal,
    #[serde(default = "BigDecimal::zero")]
    pub untracked_volume_usd: BigDecimal,
    #[serde(default)]
    pub total_swaps: u64,
}

impl Pool {
    pub fn new(address: &str, token0: &Token, token1: &Token) -> Self {
        Self {
            address: normalize_address(address),
            token0: token0.address.clone(),
            token1: token1.address.clone(),
            token0_decimals: token0.decimals,
            token1_decimals: token1.decimals,
            reserve0: BigDecimal::zero(),
            reserve1: BigDecimal::zero(),
            token0_price: BigDecimal::zero(),
            token1_price: BigDecimal::zero(),
            reserve_native: BigDecimal::zero(),
            tracked_reserve_native: BigDecimal::zero(),
            reserve_usd: BigDecimal::zero(),
            liquidity_provider_count: BigInt::zero(),
            volume_usd: BigDecimal::zero(),
            untracked_volume_usd: BigDecimal::zero(),
            total_swaps: 0,
        }
    }

    pub fn from_v2_pair_created(event: &v2::PairCreated, token0: &Token, token1: &Token) -> Self {
        Self::new(&hex_encode(event.pair.as_slice()), token0, token1)
    }

    /// Locate a token within this pool.
    pub fn side_of(&self, token: &str) -> Option<PoolSide> {
        if self.token0.eq_ignore_ascii_case(token) {
            Some(PoolSide::Token0)
        } else if self.token1.eq_ignore_ascii_case(token) {
            Some(PoolSide::Token1)
        } else {
            None
        }
    }

    /// Reserve held on one side of the pool.
    pub fn reserve_of(&self, side: PoolSide) -> &BigDecimal {
        match side {
            PoolSide::Token0 => &self.reserve0,
            PoolSide::Token1 => &self.reserve1,
        }
    }

    /// Units of the opposite token received per unit of the token on `side`.
    ///
    /// For token0 this is token1_price, for token1 it is token0_price.
    pub fn price_in_paired(&self, side: PoolSide) -> &BigDecimal {
        match side {
            PoolSide::Token0 => &self.token1_price,
            PoolSide::Token1 => &self.token0_price,
        }
    }

    /// The token on the other side of the pool.
    pub fn paired_token(&self, side: PoolSide) -> &str {
        match side {
            PoolSide::Token0 => &self.token1,
            PoolSide::Token1 => &self.token0,
        }
    }

    /// Set reserves and recompute both spot prices.
    ///
    /// A zero reserve leaves the price that would divide by it at zero.
    pub fn set_reserves(&mut self, reserve0: BigDecimal, reserve1: BigDecimal) {
        self.token0_price = safe_div(&reserve0, &reserve1);
        self.token1_price = safe_div(&reserve1, &reserve0);
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
    }

    /// Update reserves from a V2 Sync event.
    pub fn update_v2_sync(&mut self, event: &v2::Sync) {
        let reserve0: u128 = event.reserve0.to();
        let reserve1: u128 = event.reserve1.to();

        self.set_reserves(
            reserve_to_decimal(reserve0, self.token0_decimals),
            reserve_to_decimal(reserve1, self.token1_decimals),
        );
    }
}
