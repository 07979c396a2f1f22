//! Shared builders for pricing tests.

use std::{str::FromStr, sync::Arc};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::{
    config::PricingConfig,
    db::{
        models::{Bundle, Pool, Token},
        EntityStore, MemoryStore,
    },
};

pub const NATIVE: &str = "0x0000000000000000000000000000000000000001";
pub const USDC: &str = "0x0000000000000000000000000000000000000002";
pub const USDT: &str = "0x0000000000000000000000000000000000000003";
pub const TOKEN_X: &str = "0x0000000000000000000000000000000000000010";
pub const TOKEN_Y: &str = "0x0000000000000000000000000000000000000011";

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn test_config(whitelist: &[&str], stable_pools: &[&str]) -> Arc<PricingConfig> {
    Arc::new(PricingConfig::new(
        NATIVE,
        stable_pools,
        whitelist,
        dec("400000"),
        dec("2"),
        5,
    ))
}

pub fn token(address: &str, derived_native: &str) -> Token {
    let mut token = Token::new(address, String::new(), 18);
    token.derived_native = dec(derived_native);
    token
}

pub fn pool(
    address: &str,
    token0: &Token,
    token1: &Token,
    reserve0: &str,
    reserve1: &str,
    reserve_native: &str,
    liquidity_providers: u64,
) -> Pool {
    let mut pool = Pool::new(address, token0, token1);
    pool.set_reserves(dec(reserve0), dec(reserve1));
    pool.reserve_native = dec(reserve_native);
    pool.liquidity_provider_count = BigInt::from(liquidity_providers);
    pool
}

pub fn store_with(tokens: &[Token], pools: &[Pool], native_price_usd: Option<&str>) -> MemoryStore {
    let mut store = MemoryStore::new();
    for token in tokens {
        store.set_token(token).unwrap();
    }
    for pool in pools {
        store.set_pool(pool).unwrap();
    }
    if let Some(price) = native_price_usd {
        store.set_bundle(&Bundle::new(dec(price))).unwrap();
    }
    store
}
