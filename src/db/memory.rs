use std::{fs::File, io::BufReader, io::BufWriter, path::Path};

use anyhow::Context;
use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{
    models::{Bundle, Pool, Token},
    EntityStore,
};
use crate::utils::normalize_address;

/// Serialized form of a [`MemoryStore`].
///
/// Decimals are written as strings so snapshots round-trip without
/// precision loss.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub bundle: Option<Bundle>,
}

/// In-process entity store keyed by lowercase address.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tokens: FxHashMap<String, Token>,
    pools: FxHashMap<String, Pool>,
    bundle: Option<Bundle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for mut token in snapshot.tokens {
            token.address = normalize_address(&token.address);
            store.tokens.insert(token.address.clone(), token);
        }
        for mut pool in snapshot.pools {
            pool.address = normalize_address(&pool.address);
            pool.token0 = normalize_address(&pool.token0);
            pool.token1 = normalize_address(&pool.token1);
            store.pools.insert(pool.address.clone(), pool);
        }
        store.bundle = snapshot.bundle;
        store
    }

    /// Load a JSON snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        info!(
            "Loaded snapshot {} ({} tokens, {} pools)",
            path.display(),
            snapshot.tokens.len(),
            snapshot.pools.len()
        );

        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state as a JSON snapshot, ordered by address.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.to_snapshot())
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(())
    }

    pub fn to_snapshot(&self) -> Snapshot {
        let mut tokens: Vec<Token> = self.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| a.address.cmp(&b.address));
        let mut pools: Vec<Pool> = self.pools.values().cloned().collect();
        pools.sort_by(|a, b| a.address.cmp(&b.address));

        Snapshot {
            tokens,
            pools,
            bundle: self.bundle.clone(),
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }
}

impl EntityStore for MemoryStore {
    fn get_token(&self, address: &str) -> anyhow::Result<Option<Token>> {
        Ok(self.tokens.get(&normalize_address(address)).cloned())
    }

    fn get_pool(&self, address: &str) -> anyhow::Result<Option<Pool>> {
        Ok(self.pools.get(&normalize_address(address)).cloned())
    }

    fn get_bundle(&self) -> anyhow::Result<Option<Bundle>> {
        Ok(self.bundle.clone())
    }

    fn set_token(&mut self, token: &Token) -> anyhow::Result<()> {
        self.tokens
            .insert(normalize_address(&token.address), token.clone());
        Ok(())
    }

    fn set_pool(&mut self, pool: &Pool) -> anyhow::Result<()> {
        self.pools
            .insert(normalize_address(&pool.address), pool.clone());
        Ok(())
    }

    fn set_bundle(&mut self, bundle: &Bundle) -> anyhow::Result<()> {
        self.bundle = Some(bundle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_missing_entities_are_none() {
        let store = MemoryStore::new();
        assert!(store.get_token("0xabc").unwrap().is_none());
        assert!(store.get_pool("0xabc").unwrap().is_none());
        assert!(store.get_bundle().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_json_keeps_decimal_precision() {
        let json = r#"{
            "tokens": [
                { "address": "0xAAAA000000000000000000000000000000000001", "symbol": "AAA",
                  "decimals": 18, "derived_native": "0.000000000000000000123456789" }
            ],
            "pools": [
                { "address": "0xPOOL", "token0": "0xAAAA000000000000000000000000000000000001",
                  "token1": "0xbbbb000000000000000000000000000000000002",
                  "reserve0": "1000.5", "reserve1": "2001", "liquidity_provider_count": "7" }
            ],
            "bundle": { "id": "1", "native_price_usd": "1.015" }
        }"#;

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let store = MemoryStore::from_snapshot(snapshot);

        let token = store
            .get_token("0xaaaa000000000000000000000000000000000001")
            .unwrap()
            .unwrap();
        assert_eq!(
            token.derived_native,
            BigDecimal::from_str("0.000000000000000000123456789").unwrap()
        );

        let pool = store.get_pool("0xpool").unwrap().unwrap();
        assert_eq!(pool.token0, "0xaaaa000000000000000000000000000000000001");
        assert_eq!(pool.reserve0, BigDecimal::from_str("1000.5").unwrap());
        assert_eq!(pool.liquidity_provider_count, 7.into());

        let restored = serde_json::to_string(&store.to_snapshot()).unwrap();
        let reparsed = MemoryStore::from_snapshot(serde_json::from_str(&restored).unwrap());
        assert_eq!(reparsed.get_pool("0xpool").unwrap(), Some(pool));
    }
}
