use rustc_hash::FxHashMap;

use crate::{
    abis::v2,
    db::models::Pool,
    utils::{hex_encode, normalize_address, ZERO_ADDRESS},
};

/// Resolves a token pair to its pool address, like `factory.getPair`.
///
/// Must be symmetric in its arguments. `Ok(None)` means no pool exists.
pub trait PairLookup {
    fn get_pair(&self, token_a: &str, token_b: &str) -> anyhow::Result<Option<String>>;
}

/// Lookups that can learn new pairs as pools are created.
pub trait PairRegistry {
    fn register_pair(&mut self, token_a: &str, token_b: &str, pool: &str);
}

/// In-memory pair lookup keyed by the unordered token pair.
#[derive(Debug, Default, Clone)]
pub struct PairIndex {
    pairs: FxHashMap<(String, String), String>,
}

impl PairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every stored pool by its token pair.
    pub fn from_pools<'a>(pools: impl IntoIterator<Item = &'a Pool>) -> Self {
        let mut index = Self::new();
        for pool in pools {
            index.insert(&pool.token0, &pool.token1, &pool.address);
        }
        index
    }

    pub fn insert(&mut self, token_a: &str, token_b: &str, pool: &str) {
        let pool = normalize_address(pool);
        if pool == ZERO_ADDRESS {
            return;
        }
        self.pairs.insert(pair_key(token_a, token_b), pool);
    }

    pub fn insert_pair_created(&mut self, event: &v2::PairCreated) {
        self.insert(
            &hex_encode(event.token0.as_slice()),
            &hex_encode(event.token1.as_slice()),
            &hex_encode(event.pair.as_slice()),
        );
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl PairLookup for PairIndex {
    fn get_pair(&self, token_a: &str, token_b: &str) -> anyhow::Result<Option<String>> {
        Ok(self.pairs.get(&pair_key(token_a, token_b)).cloned())
    }
}

impl PairRegistry for PairIndex {
    fn register_pair(&mut self, token_a: &str, token_b: &str, pool: &str) {
        self.insert(token_a, token_b, pool);
    }
}

/// Sort tokens the way the factory does (lower address first).
fn pair_key(token_a: &str, token_b: &str) -> (String, String) {
    let a = normalize_address(token_a);
    let b = normalize_address(token_b);
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use std::str::FromStr;

    const TOKEN_A: &str = "0x00000000000000000000000000000000000000aa";
    const TOKEN_B: &str = "0x00000000000000000000000000000000000000bb";

    #[test]
    fn test_lookup_is_symmetric() {
        let mut index = PairIndex::new();
        index.insert(TOKEN_B, TOKEN_A, "0xPOOL");

        assert_eq!(index.get_pair(TOKEN_A, TOKEN_B).unwrap(), Some("0xpool".to_string()));
        assert_eq!(index.get_pair(TOKEN_B, TOKEN_A).unwrap(), Some("0xpool".to_string()));
        assert_eq!(index.get_pair(TOKEN_A, ZERO_ADDRESS).unwrap(), None);
    }

    #[test]
    fn test_zero_address_pool_is_not_indexed() {
        let mut index = PairIndex::new();
        index.insert(TOKEN_A, TOKEN_B, ZERO_ADDRESS);
        assert!(index.is_empty());
        assert_eq!(index.get_pair(TOKEN_A, TOKEN_B).unwrap(), None);
    }

    #[test]
    fn test_insert_pair_created_event() {
        let event = v2::PairCreated {
            token0: Address::from_str(TOKEN_A).unwrap(),
            token1: Address::from_str(TOKEN_B).unwrap(),
            pair: Address::from_str("0x00000000000000000000000000000000000000cc").unwrap(),
            pairCount: U256::from(1u64),
        };

        let mut index = PairIndex::new();
        index.insert_pair_created(&event);

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get_pair(TOKEN_B, TOKEN_A).unwrap(),
            Some("0x00000000000000000000000000000000000000cc".to_string())
        );
    }
}
