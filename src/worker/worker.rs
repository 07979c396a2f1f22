use std::sync::Arc;

use anyhow::Context;
use bigdecimal::BigDecimal;
use log::{debug, info, warn};
use num_bigint::BigInt;
use num_traits::Zero;

use super::{PairLookup, PairRegistry, PriceResolver, VolumeTracker};
use crate::{
    abis::v2,
    config::PricingConfig,
    db::{
        models::{Bundle, Pool, Token},
        EntityStore, MemoryStore,
    },
    utils::{hex_encode, safe_div, u256_to_decimal},
};

/// USD volume attributed to a single swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapVolume {
    /// Whitelist-gated volume counted toward aggregates
    pub tracked_usd: BigDecimal,
    /// Average of both sides at derived prices, regardless of whitelist
    pub untracked_usd: BigDecimal,
}

/// Applies pool events to stored entities.
///
/// Each handler is one unit of work: it reads the entities it needs, derives
/// fresh prices and writes the results back. Events must be fed in block
/// order; nothing is cached between calls.
pub struct PricingWorker<S, L> {
    config: Arc<PricingConfig>,
    store: S,
    pairs: L,
    resolver: PriceResolver,
    tracker: VolumeTracker,
}

impl<S: EntityStore, L: PairLookup> PricingWorker<S, L> {
    pub fn new(config: Arc<PricingConfig>, store: S, pairs: L) -> Self {
        Self {
            resolver: PriceResolver::new(config.clone()),
            tracker: VolumeTracker::new(config.clone()),
            config,
            store,
            pairs,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recompute the native USD price and persist it in the bundle.
    pub fn refresh_native_price(&mut self) -> anyhow::Result<BigDecimal> {
        let price = self.resolver.native_price_usd(&self.store)?;
        self.store
            .set_bundle(&Bundle::new(price.clone()))
            .context("Failed to save bundle")?;
        Ok(price)
    }

    /// Recompute and persist a token's derived native price.
    ///
    /// Returns None if the token has not been indexed.
    pub fn refresh_token_price(&mut self, address: &str) -> anyhow::Result<Option<BigDecimal>> {
        let Some(mut token) = self
            .store
            .get_token(address)
            .with_context(|| format!("Failed to load token {}", address))?
        else {
            debug!("Token {} not indexed, skipping price refresh", address);
            return Ok(None);
        };

        token.derived_native = self
            .resolver
            .derived_native_price(&token, &self.store, &self.pairs)?;
        self.store
            .set_token(&token)
            .with_context(|| format!("Failed to save token {}", address))?;

        Ok(Some(token.derived_native))
    }

    /// Record the current number of distinct liquidity providers of a pool.
    pub fn set_liquidity_provider_count(
        &mut self,
        pool_address: &str,
        count: BigInt,
    ) -> anyhow::Result<()> {
        let Some(mut pool) = self.load_pool(pool_address)? else {
            warn!("LP count for unknown pool {}, skipping", pool_address);
            return Ok(());
        };

        pool.liquidity_provider_count = count;
        self.save_pool(&pool)
    }

    /// Apply new reserves to a pool and refresh every price that depends on them.
    ///
    /// Order matters and follows the reserve update:
    /// 1. Pool reserves and spot prices
    /// 2. Native USD price (the pool may be a stable pool)
    /// 3. Derived native price of both tokens
    /// 4. Pool value in native, USD, and whitelist-tracked native
    pub fn handle_sync(
        &mut self,
        pool_address: &str,
        reserve0: BigDecimal,
        reserve1: BigDecimal,
    ) -> anyhow::Result<()> {
        let Some(mut pool) = self.load_pool(pool_address)? else {
            warn!("Sync for unknown pool {}, skipping", pool_address);
            return Ok(());
        };

        pool.set_reserves(reserve0, reserve1);
        self.save_pool(&pool)?;

        let native_usd = self.refresh_native_price()?;
        self.refresh_token_price(&pool.token0)?;
        self.refresh_token_price(&pool.token1)?;

        self.refresh_pool_values(&mut pool, &native_usd)
    }

    /// Recompute a pool's value in native, USD, and whitelist-tracked native
    /// from the stored token prices, then persist it.
    fn refresh_pool_values(
        &mut self,
        pool: &mut Pool,
        native_usd: &BigDecimal,
    ) -> anyhow::Result<()> {
        let (Some(token0), Some(token1)) =
            (self.load_token(&pool.token0)?, self.load_token(&pool.token1)?)
        else {
            warn!("Pool {} references unindexed tokens", pool.address);
            return Ok(());
        };

        let tracked_usd = self.tracker.tracked_liquidity_usd(
            &self.store,
            &pool.reserve0,
            &token0,
            &pool.reserve1,
            &token1,
        )?;

        pool.tracked_reserve_native = safe_div(&tracked_usd, native_usd);
        pool.reserve_native =
            &pool.reserve0 * &token0.derived_native + &pool.reserve1 * &token1.derived_native;
        pool.reserve_usd = &pool.reserve_native * native_usd;

        self.save_pool(pool)
    }

    /// Apply a raw V2 Sync event, scaling reserves by token decimals.
    pub fn handle_v2_sync(&mut self, pool_address: &str, event: &v2::Sync) -> anyhow::Result<()> {
        let Some(mut pool) = self.load_pool(pool_address)? else {
            warn!("Sync for unknown pool {}, skipping", pool_address);
            return Ok(());
        };

        pool.update_v2_sync(event);
        self.handle_sync(pool_address, pool.reserve0, pool.reserve1)
    }

    /// Classify a swap and add it to the pool's lifetime volume.
    ///
    /// `amount0`/`amount1` are the total decimal-adjusted amounts moved on each
    /// side (in + out). Returns None for an unknown pool.
    pub fn handle_swap(
        &mut self,
        pool_address: &str,
        amount0: BigDecimal,
        amount1: BigDecimal,
    ) -> anyhow::Result<Option<SwapVolume>> {
        let Some(mut pool) = self.load_pool(pool_address)? else {
            warn!("Swap for unknown pool {}, skipping", pool_address);
            return Ok(None);
        };

        let (Some(token0), Some(token1)) =
            (self.load_token(&pool.token0)?, self.load_token(&pool.token1)?)
        else {
            warn!("Swap in pool {} with unindexed tokens, skipping", pool.address);
            return Ok(None);
        };

        let native_usd = self
            .store
            .get_bundle()
            .context("Failed to load bundle")?
            .map(|b| b.native_price_usd)
            .unwrap_or_else(BigDecimal::zero);

        let tracked_usd = self.tracker.tracked_volume_usd(
            &self.store,
            &amount0,
            &token0,
            &amount1,
            &token1,
            &pool,
        )?;

        let derived_native =
            (&amount0 * &token0.derived_native + &amount1 * &token1.derived_native)
                / BigDecimal::from(2);
        let untracked_usd = derived_native * &native_usd;

        pool.volume_usd += &tracked_usd;
        pool.untracked_volume_usd += &untracked_usd;
        pool.total_swaps += 1;
        self.save_pool(&pool)?;

        Ok(Some(SwapVolume {
            tracked_usd,
            untracked_usd,
        }))
    }

    /// Apply a raw V2 Swap event.
    pub fn handle_v2_swap(
        &mut self,
        pool_address: &str,
        event: &v2::Swap,
    ) -> anyhow::Result<Option<SwapVolume>> {
        let Some(pool) = self.load_pool(pool_address)? else {
            warn!("Swap for unknown pool {}, skipping", pool_address);
            return Ok(None);
        };

        let amount0 = u256_to_decimal(event.amount0In, pool.token0_decimals)
            + u256_to_decimal(event.amount0Out, pool.token0_decimals);
        let amount1 = u256_to_decimal(event.amount1In, pool.token1_decimals)
            + u256_to_decimal(event.amount1Out, pool.token1_decimals);

        self.handle_swap(pool_address, amount0, amount1)
    }

    /// Recompute the bundle, every given token price, then the values of the
    /// given pools.
    ///
    /// Whitelisted tokens go first, in whitelist order, so tokens priced
    /// through them see fresh values within the same pass. Liquidity checks
    /// during the pass use the pool values from before it.
    pub fn refresh_prices(&mut self, tokens: &[String], pools: &[String]) -> anyhow::Result<()> {
        let native_usd = self.refresh_native_price()?;
        info!("Native price: {} USD", native_usd);

        let mut ordered: Vec<String> = self.config.whitelist().to_vec();
        let mut rest: Vec<String> = tokens
            .iter()
            .filter(|t| !self.config.is_whitelisted(t))
            .map(|t| t.to_lowercase())
            .collect();
        rest.sort();
        rest.dedup();
        ordered.extend(rest);

        let mut priced = 0usize;
        for address in &ordered {
            if let Some(price) = self.refresh_token_price(address)? {
                if !price.is_zero() {
                    priced += 1;
                }
                debug!("{} = {} native", address, price);
            }
        }

        info!("Priced {} of {} tokens", priced, ordered.len());

        let mut pools: Vec<String> = pools.iter().map(|p| p.to_lowercase()).collect();
        pools.sort();
        pools.dedup();

        for address in &pools {
            let Some(mut pool) = self.load_pool(address)? else {
                debug!("Pool {} not indexed, skipping value refresh", address);
                continue;
            };
            self.refresh_pool_values(&mut pool, &native_usd)?;
        }

        info!("Revalued {} pools", pools.len());
        Ok(())
    }

    fn load_pool(&self, address: &str) -> anyhow::Result<Option<Pool>> {
        self.store
            .get_pool(address)
            .with_context(|| format!("Failed to load pool {}", address))
    }

    fn load_token(&self, address: &str) -> anyhow::Result<Option<Token>> {
        self.store
            .get_token(address)
            .with_context(|| format!("Failed to load token {}", address))
    }

    fn save_pool(&mut self, pool: &Pool) -> anyhow::Result<()> {
        self.store
            .set_pool(pool)
            .with_context(|| format!("Failed to save pool {}", pool.address))
    }
}

impl<S: EntityStore, L: PairLookup + PairRegistry> PricingWorker<S, L> {
    /// Index a newly created pool and its tokens.
    ///
    /// Tokens already stored keep their state; metadata for new tokens is
    /// supplied by the caller, in either order. Pool sides always follow the
    /// event's token0/token1.
    pub fn handle_pair_created(
        &mut self,
        event: &v2::PairCreated,
        token_a: &Token,
        token_b: &Token,
    ) -> anyhow::Result<()> {
        let event_token0 = hex_encode(event.token0.as_slice());
        let event_token1 = hex_encode(event.token1.as_slice());

        let (token0, token1) =
            if token_a.is_address(&event_token0) && token_b.is_address(&event_token1) {
                (token_a, token_b)
            } else if token_a.is_address(&event_token1) && token_b.is_address(&event_token0) {
                (token_b, token_a)
            } else {
                anyhow::bail!(
                    "Pair {} created for {} / {}, got tokens {} / {}",
                    hex_encode(event.pair.as_slice()),
                    event_token0,
                    event_token1,
                    token_a.address,
                    token_b.address
                );
            };

        for token in [token0, token1] {
            if self.load_token(&token.address)?.is_none() {
                self.store
                    .set_token(token)
                    .with_context(|| format!("Failed to save token {}", token.address))?;
            }
        }

        let pool = Pool::from_v2_pair_created(event, token0, token1);
        if self.load_pool(&pool.address)?.is_some() {
            debug!("Pool {} already indexed", pool.address);
            return Ok(());
        }

        self.pairs
            .register_pair(&pool.token0, &pool.token1, &pool.address);
        self.save_pool(&pool)?;

        info!(
            "Indexed pool {} ({} / {})",
            pool.address, pool.token0, pool.token1
        );
        Ok(())
    }
}

impl<L: PairLookup> PricingWorker<MemoryStore, L> {
    /// Reprice every token and revalue every pool held by the in-memory store.
    pub fn refresh_all_prices(&mut self) -> anyhow::Result<()> {
        let tokens: Vec<String> = self.store.tokens().map(|t| t.address.clone()).collect();
        let pools: Vec<String> = self.store.pools().map(|p| p.address.clone()).collect();
        self.refresh_prices(&tokens, &pools)
    }
}
