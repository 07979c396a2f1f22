pub mod abis;
pub mod config;
pub mod db;
pub mod utils;
pub mod worker;

pub use config::{PricingConfig, Settings};
pub use db::{EntityStore, MemoryStore};
pub use worker::{PairFetcher, PairIndex, PairLookup, PriceResolver, PricingWorker, VolumeTracker};
