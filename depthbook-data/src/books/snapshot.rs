use super::{
    AggregatedLevel, Side, aggregator::group_levels, mid_price, raw::RawBook, sequencer::Drift,
    spread,
};
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Connection state of the feed session backing the [`OrderBookSnapshot`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[display("connecting")]
    Connecting,
    #[display("open")]
    Open,
    #[default]
    #[display("closed")]
    Closed,
    #[display("error")]
    Error,
}

/// Origin of the depth updates feeding the store.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    #[default]
    #[display("binance")]
    Binance,
    #[display("mock")]
    Mock,
}

/// Immutable, depth-limited and tick-size aggregated view of the order book.
///
/// Bids are ordered best (highest) to worst, asks best (lowest) to worst.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderBookSnapshot {
    pub time: DateTime<Utc>,
    pub tick_size: f64,
    pub bids: Vec<AggregatedLevel>,
    pub asks: Vec<AggregatedLevel>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub drift: Option<Drift>,
    pub source: FeedSource,
    pub status: ConnectionStatus,
}

impl OrderBookSnapshot {
    /// Construct an empty, [`ConnectionStatus::Closed`] [`OrderBookSnapshot`].
    pub fn empty(tick_size: f64) -> Self {
        Self {
            time: Utc::now(),
            tick_size,
            bids: vec![],
            asks: vec![],
            best_bid: None,
            best_ask: None,
            drift: None,
            source: FeedSource::default(),
            status: ConnectionStatus::default(),
        }
    }

    /// Best ask minus best bid, if both sides are present.
    pub fn spread(&self) -> Option<f64> {
        Some(spread(self.best_bid?, self.best_ask?))
    }

    /// Average of the best bid and best ask, if both sides are present.
    pub fn mid_price(&self) -> Option<f64> {
        Some(mid_price(self.best_bid?, self.best_ask?))
    }
}

impl Default for OrderBookSnapshot {
    fn default() -> Self {
        Self::empty(0.0)
    }
}

/// Builds [`OrderBookSnapshot`]s from the [`RawBook`], keeping at most `depth` aggregated levels
/// per side.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Constructor)]
pub struct SnapshotBuilder {
    pub depth: usize,
}

impl SnapshotBuilder {
    pub fn build(
        &self,
        book: &RawBook,
        tick_size: f64,
        status: ConnectionStatus,
        source: FeedSource,
        drift: Option<Drift>,
    ) -> OrderBookSnapshot {
        let bids = group_levels(book.bids().iter(), tick_size, Side::Bid);
        let asks = group_levels(book.asks().iter(), tick_size, Side::Ask);

        let bids = with_cumulative_totals(
            bids.into_iter()
                .rev()
                .take(self.depth)
                .map(|(price, amount)| (price.into_inner(), amount)),
        );
        let asks = with_cumulative_totals(
            asks.into_iter()
                .take(self.depth)
                .map(|(price, amount)| (price.into_inner(), amount)),
        );

        OrderBookSnapshot {
            time: Utc::now(),
            tick_size,
            best_bid: bids.first().map(|level| level.price),
            best_ask: asks.first().map(|level| level.price),
            bids,
            asks,
            drift,
            source,
            status,
        }
    }
}

fn with_cumulative_totals<Iter>(levels: Iter) -> Vec<AggregatedLevel>
where
    Iter: IntoIterator<Item = (f64, f64)>,
{
    levels
        .into_iter()
        .scan(0.0, |total, (price, amount)| {
            *total += amount;
            Some(AggregatedLevel::new(price, amount, *total))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> RawBook {
        let mut book = RawBook::default();
        book.apply(Side::Bid, bids);
        book.apply(Side::Ask, asks);
        book
    }

    #[test]
    fn test_snapshot_builder_build() {
        struct TestCase {
            book: RawBook,
            depth: usize,
            tick_size: f64,
            expected_bids: Vec<AggregatedLevel>,
            expected_asks: Vec<AggregatedLevel>,
        }

        let tests = vec![
            TestCase {
                // TC0: empty book
                book: RawBook::default(),
                depth: 25,
                tick_size: 0.1,
                expected_bids: vec![],
                expected_asks: vec![],
            },
            TestCase {
                // TC1: aggregation with best to worst ordering and cumulative totals
                book: book(
                    vec![(100.01, 1.0), (100.02, 2.0), (100.09, 3.0), (100.11, 4.0)],
                    vec![(100.21, 1.5), (100.35, 0.5), (100.38, 1.0)],
                ),
                depth: 25,
                tick_size: 0.1,
                expected_bids: vec![
                    AggregatedLevel::new(100.1, 4.0, 4.0),
                    AggregatedLevel::new(100.0, 6.0, 10.0),
                ],
                expected_asks: vec![
                    AggregatedLevel::new(100.3, 1.5, 1.5),
                    AggregatedLevel::new(100.4, 1.5, 3.0),
                ],
            },
            TestCase {
                // TC2: depth truncates the worst levels
                book: book(
                    vec![(97.0, 1.0), (98.0, 1.0), (99.0, 1.0)],
                    vec![(101.0, 2.0), (102.0, 2.0), (103.0, 2.0)],
                ),
                depth: 2,
                tick_size: 1.0,
                expected_bids: vec![
                    AggregatedLevel::new(99.0, 1.0, 1.0),
                    AggregatedLevel::new(98.0, 1.0, 2.0),
                ],
                expected_asks: vec![
                    AggregatedLevel::new(101.0, 2.0, 2.0),
                    AggregatedLevel::new(102.0, 2.0, 4.0),
                ],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let snapshot = SnapshotBuilder::new(test.depth).build(
                &test.book,
                test.tick_size,
                ConnectionStatus::Open,
                FeedSource::Mock,
                None,
            );
            assert_eq!(snapshot.bids, test.expected_bids, "TC{} failed", index);
            assert_eq!(snapshot.asks, test.expected_asks, "TC{} failed", index);
            assert_eq!(
                snapshot.best_bid,
                test.expected_bids.first().map(|level| level.price),
                "TC{} failed",
                index
            );
            assert_eq!(
                snapshot.best_ask,
                test.expected_asks.first().map(|level| level.price),
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_snapshot_totals_are_cumulative() {
        let book = book(
            (0..200).map(|i| (40_000.0 - i as f64 * 0.37, 0.1 + i as f64 * 0.01)).collect(),
            (0..200).map(|i| (40_001.0 + i as f64 * 0.37, 0.2 + i as f64 * 0.02)).collect(),
        );

        let snapshot = SnapshotBuilder::new(25).build(
            &book,
            1.0,
            ConnectionStatus::Open,
            FeedSource::Binance,
            None,
        );

        for levels in [&snapshot.bids, &snapshot.asks] {
            assert_eq!(levels.len(), 25);
            assert!(levels.windows(2).all(|pair| pair[1].total >= pair[0].total));

            let sum = levels.iter().map(|level| level.amount).sum::<f64>();
            let last = levels.last().unwrap().total;
            assert!((last - sum).abs() < 1e-9, "last total {last} != sum {sum}");
        }

        assert!(snapshot.bids.windows(2).all(|pair| pair[0].price > pair[1].price));
        assert!(snapshot.asks.windows(2).all(|pair| pair[0].price < pair[1].price));
    }

    #[test]
    fn test_snapshot_carries_metadata() {
        let drift = Some(Drift {
            expected: 6,
            got: 7,
        });
        let snapshot = SnapshotBuilder::new(25).build(
            &RawBook::default(),
            0.01,
            ConnectionStatus::Error,
            FeedSource::Mock,
            drift,
        );

        assert_eq!(snapshot.tick_size, 0.01);
        assert_eq!(snapshot.status, ConnectionStatus::Error);
        assert_eq!(snapshot.source, FeedSource::Mock);
        assert_eq!(snapshot.drift, drift);
    }

    #[test]
    fn test_snapshot_spread_and_mid_price() {
        let mut snapshot = OrderBookSnapshot::empty(0.1);
        assert_eq!(snapshot.spread(), None);
        assert_eq!(snapshot.mid_price(), None);

        snapshot.best_bid = Some(100.0);
        assert_eq!(snapshot.spread(), None);

        snapshot.best_ask = Some(101.0);
        assert_eq!(snapshot.spread(), Some(1.0));
        assert_eq!(snapshot.mid_price(), Some(100.5));
    }

    #[test]
    fn test_connection_status_serde() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Closed);
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Connecting).unwrap(),
            r#""connecting""#
        );
        assert_eq!(
            serde_json::from_str::<FeedSource>(r#""mock""#).unwrap(),
            FeedSource::Mock
        );
        assert_eq!(FeedSource::Binance.to_string(), "binance");
    }
}
