use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use runic_pricing::{
    db::EntityStore, MemoryStore, PairFetcher, PairIndex, PairLookup, PricingConfig,
    PricingWorker, Settings,
};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings =
        Settings::new().context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let config = Arc::new(
        PricingConfig::from_settings(&settings.pricing).context("Invalid pricing configuration")?,
    );

    let store = MemoryStore::load(&settings.snapshot.path)?;

    // Pair lookups come from the factory when an RPC endpoint is configured,
    // otherwise from the pools already in the snapshot
    match &settings.rpc {
        Some(rpc) => {
            let fetcher = PairFetcher::new(rpc).context("Failed to initialize pair fetcher")?;
            let tokens: Vec<String> = store.tokens().map(|t| t.address.clone()).collect();
            let pairs = fetcher
                .build_index(&tokens, config.whitelist())
                .await
                .context("Failed to resolve pairs from factory")?;
            info!("Using factory {} for pair lookups", rpc.factory);
            reprice(config, store, pairs, &settings)
        },
        None => {
            let pairs = PairIndex::from_pools(store.pools());
            info!("Using {} snapshot pools for pair lookups", pairs.len());
            reprice(config, store, pairs, &settings)
        },
    }
}

fn reprice<L: PairLookup>(
    config: Arc<PricingConfig>,
    store: MemoryStore,
    pairs: L,
    settings: &Settings,
) -> anyhow::Result<()> {
    let mut worker = PricingWorker::new(config, store, pairs);
    worker.refresh_all_prices()?;

    let store = worker.store();
    if let Some(bundle) = store.get_bundle()? {
        info!("Native price: {} USD", bundle.native_price_usd);
    }

    let mut tokens: Vec<_> = store.tokens().collect();
    tokens.sort_by(|a, b| a.address.cmp(&b.address));
    for token in tokens {
        info!(
            "{} ({}): {} native",
            token.address, token.symbol, token.derived_native
        );
    }

    if let Some(output) = &settings.snapshot.output {
        store.save(output)?;
        info!("Wrote repriced snapshot to {}", output);
    }

    Ok(())
}
