use std::sync::Arc;

use anyhow::Context;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    config::PricingConfig,
    db::{
        models::{Pool, Token},
        EntityStore,
    },
};

/// Whitelist membership of a pool's two tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracked {
    Both,
    Token0,
    Token1,
    Neither,
}

/// Decides how much of a trade or reserve snapshot counts toward USD aggregates.
///
/// Uses the Uniswap whitelist approach:
/// - Only amounts of whitelisted tokens are trusted
/// - Swaps: both whitelisted → average of both sides, one → that side, none → 0
/// - Liquidity: both whitelisted → sum, one → that side doubled, none → 0
///
/// Swaps in pools with fewer than `min_liquidity_providers` LPs only count once
/// the pool holds `min_usd_threshold_new_pools` worth of whitelisted reserves,
/// so wash trades in a freshly created pool cannot inflate volume.
#[derive(Debug, Clone)]
pub struct VolumeTracker {
    config: Arc<PricingConfig>,
}

impl VolumeTracker {
    pub fn new(config: Arc<PricingConfig>) -> Self {
        Self { config }
    }

    fn tracked(&self, token0: &Token, token1: &Token) -> Tracked {
        match (
            self.config.is_whitelisted(&token0.address),
            self.config.is_whitelisted(&token1.address),
        ) {
            (true, true) => Tracked::Both,
            (true, false) => Tracked::Token0,
            (false, true) => Tracked::Token1,
            (false, false) => Tracked::Neither,
        }
    }

    /// USD price of the native token from the bundle; 0 if never computed.
    fn native_price_usd<S: EntityStore>(store: &S) -> anyhow::Result<BigDecimal> {
        Ok(store
            .get_bundle()
            .context("Failed to load bundle")?
            .map(|b| b.native_price_usd)
            .unwrap_or_else(BigDecimal::zero))
    }

    /// Tracked USD volume of a swap.
    ///
    /// Amounts are the decimal-adjusted totals moved on each side.
    pub fn tracked_volume_usd<S: EntityStore>(
        &self,
        store: &S,
        amount0: &BigDecimal,
        token0: &Token,
        amount1: &BigDecimal,
        token1: &Token,
        pool: &Pool,
    ) -> anyhow::Result<BigDecimal> {
        let native_usd = Self::native_price_usd(store)?;
        let price0 = &token0.derived_native * &native_usd;
        let price1 = &token1.derived_native * &native_usd;
        let tracked = self.tracked(token0, token1);

        // Few LPs: require deep whitelisted reserves or drop the volume
        if pool.liquidity_provider_count < BigInt::from(self.config.min_liquidity_providers) {
            let threshold = &self.config.min_usd_threshold_new_pools;
            let reserve0_usd = &pool.reserve0 * &price0;
            let reserve1_usd = &pool.reserve1 * &price1;

            let below = match tracked {
                Tracked::Both => &(&reserve0_usd + &reserve1_usd) < threshold,
                Tracked::Token0 => &(&reserve0_usd * BigDecimal::from(2)) < threshold,
                Tracked::Token1 => &(&reserve1_usd * BigDecimal::from(2)) < threshold,
                // Untracked below anyway
                Tracked::Neither => false,
            };

            if below {
                return Ok(BigDecimal::zero());
            }
        }

        let volume = match tracked {
            Tracked::Both => (amount0 * &price0 + amount1 * &price1) / BigDecimal::from(2),
            Tracked::Token0 => amount0 * &price0,
            Tracked::Token1 => amount1 * &price1,
            Tracked::Neither => BigDecimal::zero(),
        };

        Ok(volume)
    }

    /// Tracked USD value of a liquidity snapshot (e.g. pool reserves).
    ///
    /// A single trusted side is doubled: constant-product pools hold equal
    /// value on both sides.
    pub fn tracked_liquidity_usd<S: EntityStore>(
        &self,
        store: &S,
        amount0: &BigDecimal,
        token0: &Token,
        amount1: &BigDecimal,
        token1: &Token,
    ) -> anyhow::Result<BigDecimal> {
        let native_usd = Self::native_price_usd(store)?;
        let price0 = &token0.derived_native * &native_usd;
        let price1 = &token1.derived_native * &native_usd;

        let liquidity = match self.tracked(token0, token1) {
            Tracked::Both => amount0 * &price0 + amount1 * &price1,
            Tracked::Token0 => amount0 * &price0 * BigDecimal::from(2),
            Tracked::Token1 => amount1 * &price1 * BigDecimal::from(2),
            Tracked::Neither => BigDecimal::zero(),
        };

        Ok(liquidity)
    }
}
