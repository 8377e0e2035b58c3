use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Per-side raw price → amount state, with pruning of levels far from the spread.
pub mod raw;

/// Tick-size bucketing of raw price levels.
pub mod aggregator;

/// [`SequenceTracker`](sequencer::SequenceTracker) flagging forward sequence gaps as
/// [`Drift`](sequencer::Drift).
pub mod sequencer;

/// Bounded FIFO of [`DepthUpdate`]s awaiting the next flush.
pub mod buffer;

/// Published [`OrderBookSnapshot`](snapshot::OrderBookSnapshot) and the builder producing it.
pub mod snapshot;

/// Side of the book a level rests on. Determines sort direction and bucket rounding direction.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[display("bid")]
    Bid,
    #[display("ask")]
    Ask,
}

/// Unaggregated price level as received from the feed.
///
/// An `amount` that is not strictly positive (or not finite) removes the level at `price`.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct RawLevel {
    pub price: f64,
    pub amount: f64,
}

impl From<(f64, f64)> for RawLevel {
    fn from((price, amount): (f64, f64)) -> Self {
        Self::new(price, amount)
    }
}

/// Normalised incremental book update produced by a feed decoder.
///
/// Immutable once enqueued, and applied exactly once by a flush cycle.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepthUpdate {
    pub sequence: u64,
    pub time: DateTime<Utc>,
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

/// Tick-size bucketed level of a published snapshot.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct AggregatedLevel {
    /// Bucket boundary price.
    pub price: f64,
    /// Sum of the raw amounts falling into this bucket.
    pub amount: f64,
    /// Cumulative amount from the best level through this level, inclusive.
    pub total: f64,
}

/// Calculate the mid-price by taking the average of the best bid and ask prices.
pub fn mid_price(best_bid_price: f64, best_ask_price: f64) -> f64 {
    (best_bid_price + best_ask_price) / 2.0
}

/// Calculate the spread between the best ask and best bid prices.
pub fn spread(best_bid_price: f64, best_ask_price: f64) -> f64 {
    best_ask_price - best_bid_price
}
