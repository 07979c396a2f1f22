use std::sync::Arc;

use anyhow::Context;
use bigdecimal::BigDecimal;
use log::{debug, warn};
use num_traits::{One, Zero};

use super::PairLookup;
use crate::{
    config::PricingConfig,
    db::{
        models::{Pool, PoolSide, Token},
        EntityStore,
    },
    utils::{safe_div, ZERO_ADDRESS},
};

/// Reference price resolution from pool reserves.
///
/// Two prices are derived, both without an oracle:
/// 1. Native token → USD, from the configured native/stablecoin pools
///    (reserve-weighted when several exist)
/// 2. Any token → native, through a single whitelisted pool
///
/// Whitelist order is the tie-break: the first whitelisted token with a
/// liquid enough pool against the target sets its price, even when a later
/// entry has a deeper pool. Tokens that are two hops away from the whitelist
/// stay unpriced.
///
/// Holds no state besides configuration, so repeated calls against the same
/// stored entities return identical decimals.
#[derive(Debug, Clone)]
pub struct PriceResolver {
    config: Arc<PricingConfig>,
}

impl PriceResolver {
    pub fn new(config: Arc<PricingConfig>) -> Self {
        Self { config }
    }

    /// USD price of the wrapped native token.
    ///
    /// - No stable pool indexed → 0 (no confidence; callers must not treat it as a price)
    /// - One stable pool → that pool's price, unweighted
    /// - Several → each pool's price weighted by its share of the native reserve
    ///
    /// Pure read: the caller persists the result into the bundle.
    pub fn native_price_usd<S: EntityStore>(&self, store: &S) -> anyhow::Result<BigDecimal> {
        let mut quotes: Vec<(BigDecimal, BigDecimal)> =
            Vec::with_capacity(self.config.stable_pools.len());

        for address in &self.config.stable_pools {
            let Some(pool) = store
                .get_pool(address)
                .with_context(|| format!("Failed to load stable pool {}", address))?
            else {
                debug!("Stable pool {} not indexed yet", address);
                continue;
            };

            match self.stable_pool_quote(&pool) {
                Some(quote) => quotes.push(quote),
                None => warn!(
                    "Stable pool {} does not contain wrapped native {}, ignoring",
                    pool.address, self.config.wrapped_native
                ),
            }
        }

        let price = match quotes.as_slice() {
            [] => BigDecimal::zero(),
            [(_, price)] => price.clone(),
            _ => {
                let total_native: BigDecimal = quotes.iter().map(|(reserve, _)| reserve).sum();
                if total_native.is_zero() {
                    return Ok(BigDecimal::zero());
                }

                quotes
                    .iter()
                    .map(|(reserve, price)| price * safe_div(reserve, &total_native))
                    .sum()
            },
        };

        Ok(price)
    }

    /// Native-side reserve and USD-per-native price of a stable pool.
    ///
    /// Returns None if the pool does not hold the wrapped native token.
    fn stable_pool_quote(&self, pool: &Pool) -> Option<(BigDecimal, BigDecimal)> {
        let native_side = pool.side_of(&self.config.wrapped_native)?;

        // Stablecoin per native: the price of the native side quoted in the paired token
        Some((
            pool.reserve_of(native_side).clone(),
            pool.price_in_paired(native_side).clone(),
        ))
    }

    /// Price of one unit of `token` in wrapped native units.
    ///
    /// Walks the whitelist in order and returns at the first pool whose
    /// native-denominated reserve exceeds the minimum liquidity threshold:
    /// `price of token in paired token * paired token's derived native price`.
    ///
    /// Returns 0 when no whitelisted token has a qualifying pool.
    pub fn derived_native_price<S: EntityStore, L: PairLookup>(
        &self,
        token: &Token,
        store: &S,
        pairs: &L,
    ) -> anyhow::Result<BigDecimal> {
        if self.config.is_wrapped_native(&token.address) {
            return Ok(BigDecimal::one());
        }

        for entry in self.config.whitelist() {
            if token.is_address(entry) {
                continue;
            }

            let Some(pool_address) = pairs
                .get_pair(&token.address, entry)
                .with_context(|| format!("Pair lookup failed for {} / {}", token.address, entry))?
            else {
                continue;
            };
            if pool_address == ZERO_ADDRESS {
                continue;
            }

            let Some(pool) = store
                .get_pool(&pool_address)
                .with_context(|| format!("Failed to load pool {}", pool_address))?
            else {
                debug!("Pool {} for {} not indexed yet", pool_address, token.address);
                continue;
            };

            let Some(side) = pool.side_of(&token.address) else {
                warn!(
                    "Pool {} returned for {} does not contain it",
                    pool.address, token.address
                );
                continue;
            };

            if pool.reserve_native > self.config.min_native_liquidity {
                return self.price_through(&pool, side, store);
            }
        }

        Ok(BigDecimal::zero())
    }

    fn price_through<S: EntityStore>(
        &self,
        pool: &Pool,
        side: PoolSide,
        store: &S,
    ) -> anyhow::Result<BigDecimal> {
        let paired_address = pool.paired_token(side);
        let paired_native = store
            .get_token(paired_address)
            .with_context(|| format!("Failed to load token {}", paired_address))?
            .map(|t| t.derived_native)
            .unwrap_or_else(BigDecimal::zero);

        Ok(pool.price_in_paired(side) * paired_native)
    }
}
