use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::{DynProvider, ProviderBuilder},
};
use anyhow::{Context, Result};
use log::{debug, info};
use moka::future::Cache;
use rustc_hash::FxHashSet;
use url::Url;

use super::PairIndex;
use crate::{
    abis::IUniswapV2Factory,
    config::RpcSettings,
    utils::{hex_encode, normalize_address, ZERO_ADDRESS},
};

/// Maximum retries per getPair call
const MAX_RETRIES: u32 = 3;

/// Delay between retries (exponential backoff base)
const RETRY_DELAY_MS: u64 = 100;

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Concurrent getPair calls per batch to avoid RPC congestion
const LOOKUP_BATCH_SIZE: usize = 20;

/// Resolves token pairs through the factory's `getPair` over RPC.
#[derive(Clone)]
pub struct PairFetcher {
    provider: DynProvider,
    factory: Address,
    /// Pairs the factory reported as nonexistent, shared by clones and kept
    /// across `fetch_pair`/`build_index` calls. Entries expire because a pool
    /// may be created later.
    missing_pairs: Cache<String, ()>,
}

impl PairFetcher {
    pub fn new(settings: &RpcSettings) -> Result<Self> {
        let url = Url::parse(&settings.url).context("Invalid RPC URL")?;
        let factory: Address = settings
            .factory
            .parse()
            .context("Invalid factory address")?;

        let client = ProviderBuilder::new().connect_http(url);
        let provider = DynProvider::new(client);

        let missing_pairs = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(Duration::from_secs(600))
            .build();

        Ok(Self {
            provider,
            factory,
            missing_pairs,
        })
    }

    /// Resolve every (token, whitelist entry) pair into a [`PairIndex`].
    pub async fn build_index(&self, tokens: &[String], whitelist: &[String]) -> Result<PairIndex> {
        let candidates = candidate_pairs(tokens, whitelist);
        let mut index = PairIndex::new();

        for chunk in candidates.chunks(LOOKUP_BATCH_SIZE) {
            let tasks = chunk.iter().map(|(a, b)| self.fetch_pair(a, b));
            let results = futures::future::join_all(tasks).await;

            for ((token_a, token_b), result) in chunk.iter().zip(results) {
                if let Some(pool) = result? {
                    index.insert(token_a, token_b, &pool);
                }
            }
        }

        info!(
            "Resolved {} pairs from {} candidate lookups",
            index.len(),
            candidates.len()
        );

        Ok(index)
    }

    /// Fetch a single pair with retry logic. `None` when no pool exists.
    pub async fn fetch_pair(&self, token_a: &str, token_b: &str) -> Result<Option<String>> {
        let key = missing_key(token_a, token_b);
        if self.missing_pairs.contains_key(&key) {
            return Ok(None);
        }

        let a: Address = token_a
            .parse()
            .with_context(|| format!("Invalid token address {}", token_a))?;
        let b: Address = token_b
            .parse()
            .with_context(|| format!("Invalid token address {}", token_b))?;

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            match self.call_get_pair(a, b).await {
                Ok(pair) => {
                    let pair = hex_encode(pair.as_slice());
                    if pair == ZERO_ADDRESS {
                        self.missing_pairs.insert(key, ()).await;
                        return Ok(None);
                    }
                    return Ok(Some(pair));
                },
                Err(e) => {
                    debug!(
                        "getPair({}, {}) attempt {} failed: {:#}",
                        token_a,
                        token_b,
                        attempt + 1,
                        e
                    );
                    last_error = Some(e);
                    if attempt < MAX_RETRIES - 1 {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * 2_u64.pow(attempt));
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("getPair failed"))
            .context(format!("getPair({}, {}) failed after retries", token_a, token_b)))
    }

    async fn call_get_pair(&self, token_a: Address, token_b: Address) -> Result<Address> {
        let factory = IUniswapV2Factory::new(self.factory, &self.provider);

        let pair = tokio::time::timeout(RPC_CALL_TIMEOUT, factory.getPair(token_a, token_b).call())
            .await
            .context("getPair timeout")?
            .context("getPair call failed")?;

        Ok(pair)
    }
}

/// Unordered (token, whitelist entry) pairs to look up, without self pairs
/// or repeats. A whitelisted token meets every other entry only once.
fn candidate_pairs(tokens: &[String], whitelist: &[String]) -> Vec<(String, String)> {
    let mut seen = FxHashSet::default();
    let mut candidates = Vec::new();

    for token in tokens {
        for entry in whitelist {
            if token.eq_ignore_ascii_case(entry) {
                continue;
            }
            if seen.insert(missing_key(token, entry)) {
                candidates.push((normalize_address(token), normalize_address(entry)));
            }
        }
    }

    candidates
}

fn missing_key(token_a: &str, token_b: &str) -> String {
    let a = normalize_address(token_a);
    let b = normalize_address(token_b);
    if a < b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATIVE: &str = "0x0000000000000000000000000000000000000001";
    const USDC: &str = "0x0000000000000000000000000000000000000002";
    const TOKEN_X: &str = "0x0000000000000000000000000000000000000010";

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_missing_key_is_symmetric() {
        assert_eq!(missing_key(NATIVE, USDC), missing_key(USDC, NATIVE));
        assert_eq!(
            missing_key(&NATIVE.to_uppercase().replace("0X", "0x"), USDC),
            missing_key(USDC, NATIVE)
        );
        assert_ne!(missing_key(NATIVE, USDC), missing_key(NATIVE, TOKEN_X));
    }

    #[test]
    fn test_candidates_skip_self_and_repeated_pairs() {
        let tokens = strings(&[NATIVE, USDC, TOKEN_X]);
        let whitelist = strings(&[NATIVE, USDC]);

        let candidates = candidate_pairs(&tokens, &whitelist);

        // native/usdc appears once, no token is paired with itself
        assert_eq!(
            candidates,
            vec![
                (NATIVE.to_string(), USDC.to_string()),
                (TOKEN_X.to_string(), NATIVE.to_string()),
                (TOKEN_X.to_string(), USDC.to_string()),
            ]
        );
        assert!(candidates.iter().all(|(a, b)| a != b));
    }

    #[test]
    fn test_candidates_ignore_address_case() {
        let tokens = strings(&["0x00000000000000000000000000000000000000AA"]);
        let whitelist = strings(&["0x00000000000000000000000000000000000000aa", NATIVE]);

        let candidates = candidate_pairs(&tokens, &whitelist);
        assert_eq!(
            candidates,
            vec![(
                "0x00000000000000000000000000000000000000aa".to_string(),
                NATIVE.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_known_missing_pair_skips_rpc() {
        let fetcher = PairFetcher::new(&RpcSettings {
            url: "http://127.0.0.1:1".to_string(),
            factory: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f".to_string(),
        })
        .unwrap();

        fetcher.missing_pairs.insert(missing_key(NATIVE, USDC), ()).await;

        // served from the cache in either order, the endpoint is never dialed
        assert_eq!(fetcher.fetch_pair(USDC, NATIVE).await.unwrap(), None);
        assert_eq!(fetcher.clone().fetch_pair(NATIVE, USDC).await.unwrap(), None);
    }
}
