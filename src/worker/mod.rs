pub mod pair_fetcher;
pub mod pairs;
pub mod price_resolver;
pub mod volume_tracker;
pub mod worker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use pair_fetcher::PairFetcher;
pub use pairs::{PairIndex, PairLookup, PairRegistry};
pub use price_resolver::PriceResolver;
pub use volume_tracker::VolumeTracker;
pub use worker::{PricingWorker, SwapVolume};
