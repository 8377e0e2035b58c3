use super::Side;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Distance from an integer, in units of that integer's `f64::EPSILON` scale, within which a
/// bucket index is treated as that integer.
///
/// Absorbs binary residue such as `100.1 / 0.1 == 1000.9999999999999` without snapping genuine
/// sub-tick prices onto a boundary.
const BUCKET_INDEX_ULPS: f64 = 4.0;

/// Scale used to round bucket boundary prices to 10 decimal digits.
const PRICE_ROUNDING_SCALE: f64 = 1e10;

/// Map a raw price onto the boundary of its tick-size bucket.
///
/// Bids round down to the bucket floor, asks round up to the bucket ceiling. A `tick_size` that
/// is not strictly positive (including NaN) returns the price unchanged.
pub fn group_price(price: f64, tick_size: f64, side: Side) -> f64 {
    if !(tick_size > 0.0) {
        return price;
    }

    let index = snap_bucket_index(price / tick_size);
    let index = match side {
        Side::Bid => index.floor(),
        Side::Ask => index.ceil(),
    };

    round_price(index * tick_size)
}

/// Sum raw level amounts into tick-size buckets for one [`Side`].
///
/// Levels with a non-positive amount do not contribute, so a bucket is only present if at least
/// one positive amount fell into it. The returned map iterates in ascending price order.
pub fn group_levels<Iter>(levels: Iter, tick_size: f64, side: Side) -> BTreeMap<OrderedFloat<f64>, f64>
where
    Iter: IntoIterator<Item = (f64, f64)>,
{
    levels
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .fold(BTreeMap::new(), |mut buckets, (price, amount)| {
            *buckets
                .entry(OrderedFloat(group_price(price, tick_size, side)))
                .or_insert(0.0) += amount;
            buckets
        })
}

fn snap_bucket_index(index: f64) -> f64 {
    let nearest = index.round();
    if (index - nearest).abs() <= BUCKET_INDEX_ULPS * f64::EPSILON * nearest.abs().max(1.0) {
        nearest
    } else {
        index
    }
}

fn round_price(price: f64) -> f64 {
    let scaled = price * PRICE_ROUNDING_SCALE;
    if scaled.is_finite() {
        scaled.round() / PRICE_ROUNDING_SCALE
    } else {
        price
    }
}
