use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Whitelist, stable pool and threshold configuration.
///
/// Redeployed per network: every address and threshold here is expected to
/// change between chains. Thresholds are decimal strings so they are parsed
/// exactly, never through f64.
#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    /// Wrapped native token (WETH, WKCS, ...)
    pub wrapped_native: String,
    /// Native/stablecoin pools used to price the native token in USD
    #[serde(default)]
    pub stable_pools: Vec<String>,
    /// Trusted reference tokens. Order is the pricing tie-break.
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Minimum USD liquidity for volume in pools with few LPs to count
    #[serde(default = "default_min_usd_threshold_new_pools")]
    pub min_usd_threshold_new_pools: String,
    /// Minimum native-denominated reserve for a pool to be used as a price source
    #[serde(default = "default_min_native_liquidity")]
    pub min_native_liquidity: String,
    /// Pools with fewer LPs than this are treated as new
    #[serde(default = "default_min_liquidity_providers")]
    pub min_liquidity_providers: u64,
}

fn default_min_usd_threshold_new_pools() -> String {
    "400000".to_string()
}

fn default_min_native_liquidity() -> String {
    "2".to_string()
}

fn default_min_liquidity_providers() -> u64 {
    5
}

/// JSON entity snapshot locations for the `reprice` binary.
#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    pub path: String,
    /// Where to write the repriced snapshot. Nothing is written when unset.
    #[serde(default)]
    pub output: Option<String>,
}

/// RPC access for resolving pairs through the factory contract.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    pub url: String,
    /// Uniswap V2 style factory exposing `getPair(address,address)`
    pub factory: String,
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub pricing: PricingSettings,
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub rpc: Option<RpcSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
