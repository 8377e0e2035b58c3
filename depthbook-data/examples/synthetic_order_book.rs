use depthbook_data::{
    config::{ConnectConfig, StoreConfig, TICK_SIZE_CHOICES},
    logging::init_logging,
    store::OrderBookStore,
};
use std::{fs::File, io::BufReader, time::Duration};
use tracing::info;

const FILE_PATH_STORE_CONFIG: &str = "depthbook-data/examples/config/store_config.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise Tracing
    init_logging();

    // Construct OrderBookStore
    let store = OrderBookStore::new(load_config()?)?;

    // Print the top of book for every published snapshot
    let subscription = store.subscribe(|snapshot| {
        info!(
            status = %snapshot.status,
            tick_size = snapshot.tick_size,
            best_bid = ?snapshot.best_bid,
            best_ask = ?snapshot.best_ask,
            spread = ?snapshot.spread(),
            drift = ?snapshot.drift,
            "order book snapshot"
        );
    });

    // Stream the synthetic feed, cycling through each tick size choice
    store.connect(ConnectConfig { use_mock: true });
    for tick_size in TICK_SIZE_CHOICES {
        store.set_tick_size(tick_size);
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    store.disconnect();
    subscription.unsubscribe();

    let snapshot = store.snapshot();
    info!(status = %snapshot.status, bids = snapshot.bids.len(), "order book store disconnected");

    Ok(())
}

fn load_config() -> Result<StoreConfig, Box<dyn std::error::Error>> {
    let file = File::open(FILE_PATH_STORE_CONFIG)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}
