use crate::{config::SyntheticConfig, exchange::binance::DEPTH_UPDATE_EVENT};
use chrono::Utc;
use depthbook_integration::{
    error::SocketError,
    protocol::websocket::WsMessage,
    transport::{Transport, TransportHandler},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::info;

/// Random walk generator of `Binance` format diff depth messages.
///
/// Each message moves the mid price by a uniform step and quotes `levels_per_side` bids below and
/// asks above it, starting at the mid itself, with a strictly increasing sequence number
/// starting at 1.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    symbol: String,
    levels_per_side: usize,
    max_mid_step: f64,
    mid: f64,
    sequence: u64,
    rng: StdRng,
}

impl SyntheticFeed {
    pub fn new(config: &SyntheticConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            symbol: config.symbol.clone(),
            levels_per_side: config.levels_per_side,
            max_mid_step: config.max_mid_step,
            mid: config.initial_mid,
            sequence: 0,
            rng,
        }
    }

    /// Delay between two generated messages at the configured rate, at least 1ms.
    pub fn period(config: &SyntheticConfig) -> Duration {
        Duration::from_millis((1000 / config.messages_per_second.max(1)).max(1))
    }

    pub fn mid(&self) -> f64 {
        self.mid
    }

    /// Advance the random walk and produce the next `depthUpdate` text message.
    pub fn next_message(&mut self) -> WsMessage {
        self.sequence += 1;
        self.mid += self
            .rng
            .random_range(-self.max_mid_step..=self.max_mid_step);

        let bids = self.levels(-1.0);
        let asks = self.levels(1.0);

        let message = json!({
            "e": DEPTH_UPDATE_EVENT,
            "E": Utc::now().timestamp_millis(),
            "s": self.symbol,
            "U": self.sequence,
            "u": self.sequence,
            "b": bids,
            "a": asks,
        });

        WsMessage::text(message.to_string())
    }

    fn levels(&mut self, direction: f64) -> Vec<[String; 2]> {
        (0..self.levels_per_side)
            .map(|index| {
                let offset = index as f64 * self.rng.random_range(0.5_f64..2.0);
                let price = self.mid + direction * offset;
                let amount = (self.rng.random_range(0.0_f64..5.0)
                    - self.rng.random_range(0.0_f64..0.3))
                .max(0.0);
                [format!("{price:.2}"), format!("{amount:.6}")]
            })
            .collect()
    }
}

/// [`Transport`] driving a [`SyntheticFeed`] from a spawned task.
///
/// The task invokes `on_open` immediately, then `on_message` once per
/// [`SyntheticFeed::period`] until closed. It never closes or errors by itself.
#[derive(Debug)]
pub struct SyntheticTransport {
    task: Option<JoinHandle<()>>,
}

impl SyntheticTransport {
    pub fn open(config: &SyntheticConfig, handler: Arc<dyn TransportHandler>) -> Self {
        let feed = SyntheticFeed::new(config);
        let period = SyntheticFeed::period(config);

        info!(
            symbol = %config.symbol,
            messages_per_second = config.messages_per_second,
            seed = ?config.seed,
            "starting synthetic depth feed"
        );

        Self {
            task: Some(tokio::spawn(run(feed, period, handler))),
        }
    }
}

impl Transport for SyntheticTransport {
    fn close(&mut self) -> Result<(), SocketError> {
        let task = self
            .task
            .take()
            .ok_or_else(|| SocketError::Terminated("synthetic feed already closed".to_string()))?;

        task.abort();
        info!("synthetic depth feed closed");
        Ok(())
    }
}

impl Drop for SyntheticTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(mut feed: SyntheticFeed, period: Duration, handler: Arc<dyn TransportHandler>) {
    handler.on_open();

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        handler.on_message(feed.next_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{DepthDecoder, binance::BinanceDepthDecoder};
    use parking_lot::Mutex;

    fn seeded(seed: u64) -> SyntheticConfig {
        SyntheticConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_synthetic_feed_message_shape() {
        let config = seeded(7);
        let mut feed = SyntheticFeed::new(&config);

        for expected_sequence in 1..=50 {
            let update = BinanceDepthDecoder.decode(&feed.next_message()).unwrap();
            assert_eq!(update.sequence, expected_sequence);
            assert_eq!(update.bids.len(), config.levels_per_side);
            assert_eq!(update.asks.len(), config.levels_per_side);

            let mid = feed.mid();
            // Prices are rounded to 2 decimals, so allow for rounding at the mid
            assert!(update.bids.iter().all(|level| level.price <= mid + 0.005));
            assert!(update.asks.iter().all(|level| level.price >= mid - 0.005));
            assert!((update.bids[0].price - mid).abs() <= 0.006);
            assert!((update.asks[0].price - mid).abs() <= 0.006);
            assert!(
                update
                    .bids
                    .iter()
                    .chain(update.asks.iter())
                    .all(|level| level.amount >= 0.0 && level.amount <= 5.0)
            );
        }
    }

    #[test]
    fn test_synthetic_feed_mid_step_is_bounded() {
        let config = seeded(11);
        let mut feed = SyntheticFeed::new(&config);

        let mut previous = feed.mid();
        for _ in 0..1_000 {
            feed.next_message();
            assert!((feed.mid() - previous).abs() <= config.max_mid_step + 1e-9);
            previous = feed.mid();
        }
    }

    #[test]
    fn test_synthetic_feed_seeded_runs_are_reproducible() {
        let mut first = SyntheticFeed::new(&seeded(42));
        let mut second = SyntheticFeed::new(&seeded(42));

        for _ in 0..10 {
            let first = BinanceDepthDecoder.decode(&first.next_message()).unwrap();
            let second = BinanceDepthDecoder.decode(&second.next_message()).unwrap();
            assert_eq!(first.bids, second.bids);
            assert_eq!(first.asks, second.asks);
        }
    }

    #[test]
    fn test_synthetic_feed_period() {
        struct TestCase {
            messages_per_second: u64,
            expected: Duration,
        }

        let tests = vec![
            TestCase {
                // TC0: default rate
                messages_per_second: 140,
                expected: Duration::from_millis(7),
            },
            TestCase {
                // TC1: one per second
                messages_per_second: 1,
                expected: Duration::from_millis(1000),
            },
            TestCase {
                // TC2: rate above 1000/s is capped at one per millisecond
                messages_per_second: 5000,
                expected: Duration::from_millis(1),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let config = SyntheticConfig {
                messages_per_second: test.messages_per_second,
                ..Default::default()
            };
            assert_eq!(SyntheticFeed::period(&config), test.expected, "TC{} failed", index);
        }
    }

    #[derive(Debug, Default)]
    struct CountingHandler {
        opened: Mutex<usize>,
        sequences: Mutex<Vec<u64>>,
    }

    impl TransportHandler for CountingHandler {
        fn on_open(&self) {
            *self.opened.lock() += 1;
        }

        fn on_close(&self) {}

        fn on_error(&self) {}

        fn on_message(&self, payload: WsMessage) {
            if let Ok(update) = BinanceDepthDecoder.decode(&payload) {
                self.sequences.lock().push(update.sequence);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthetic_transport_emits_until_closed() {
        let config = SyntheticConfig {
            messages_per_second: 100,
            seed: Some(1),
            ..Default::default()
        };
        let handler = Arc::new(CountingHandler::default());
        let mut transport = SyntheticTransport::open(&config, handler.clone());

        tokio::time::sleep(Duration::from_millis(105)).await;

        assert_eq!(*handler.opened.lock(), 1);
        let sequences = handler.sequences.lock().clone();
        assert_eq!(sequences, (1..=10).collect::<Vec<_>>());

        assert!(transport.close().is_ok());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handler.sequences.lock().len(), 10);

        assert!(matches!(
            transport.close(),
            Err(SocketError::Terminated(_))
        ));
    }
}
