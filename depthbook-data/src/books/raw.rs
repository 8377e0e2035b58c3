use super::{DepthUpdate, RawLevel, Side};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use tracing::debug;

/// Raw price → amount mapping for one [`Side`] of the book, keyed in ascending price order.
///
/// Invariant: a price is present iff its amount is finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBookSide {
    side: Side,
    levels: BTreeMap<OrderedFloat<f64>, f64>,
}

impl RawBookSide {
    /// Construct a new empty [`RawBookSide`].
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterator over `(price, amount)` in ascending price order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (f64, f64)> + '_ {
        self.levels
            .iter()
            .map(|(price, amount)| (price.into_inner(), *amount))
    }

    /// Apply absolute level amounts to this side.
    ///
    /// ### Apply Scenarios
    /// 1. Price is not finite: skip the level
    /// 2. Amount is not finite or <= 0: remove any level at the price
    /// 3. Otherwise: insert or replace the level
    pub fn apply<Iter, L>(&mut self, levels: Iter)
    where
        Iter: IntoIterator<Item = L>,
        L: Into<RawLevel>,
    {
        for level in levels {
            let RawLevel { price, amount } = level.into();

            if !price.is_finite() {
                debug!(price, amount, side = %self.side, "skipping level with non-finite price");
                continue;
            }

            if amount.is_finite() && amount > 0.0 {
                self.levels.insert(OrderedFloat(price), amount);
            } else {
                self.levels.remove(&OrderedFloat(price));
            }
        }
    }

    /// Evict the levels farthest from the spread until at most `max_levels` remain.
    ///
    /// Bids lose their lowest prices, asks their highest. Returns the number of evicted levels.
    pub fn prune(&mut self, max_levels: usize) -> usize {
        let excess = self.levels.len().saturating_sub(max_levels);

        for _ in 0..excess {
            match self.side {
                Side::Bid => self.levels.pop_first(),
                Side::Ask => self.levels.pop_last(),
            };
        }

        excess
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Raw, unaggregated two-sided book state.
///
/// Mutated only by the flush cycle of the [`OrderBookStore`](crate::store::OrderBookStore).
#[derive(Debug, Clone, PartialEq)]
pub struct RawBook {
    bids: RawBookSide,
    asks: RawBookSide,
}

impl Default for RawBook {
    fn default() -> Self {
        Self {
            bids: RawBookSide::new(Side::Bid),
            asks: RawBookSide::new(Side::Ask),
        }
    }
}

impl RawBook {
    pub fn bids(&self) -> &RawBookSide {
        &self.bids
    }

    pub fn asks(&self) -> &RawBookSide {
        &self.asks
    }

    /// Apply levels to the provided [`Side`].
    pub fn apply<Iter, L>(&mut self, side: Side, levels: Iter)
    where
        Iter: IntoIterator<Item = L>,
        L: Into<RawLevel>,
    {
        match side {
            Side::Bid => self.bids.apply(levels),
            Side::Ask => self.asks.apply(levels),
        }
    }

    /// Apply the bid then ask deltas of a [`DepthUpdate`].
    pub fn apply_update(&mut self, update: DepthUpdate) {
        self.bids.apply(update.bids);
        self.asks.apply(update.asks);
    }

    /// Prune both sides to `max_levels`, returning the total number of evicted levels.
    pub fn prune(&mut self, max_levels: usize) -> usize {
        let evicted = self.bids.prune(max_levels) + self.asks.prune(max_levels);
        if evicted > 0 {
            debug!(
                evicted,
                max_levels, "pruned raw levels farthest from the spread"
            );
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}
