use super::DepthDecoder;
use crate::{
    books::{DepthUpdate, RawLevel},
    error::DataError,
};
use chrono::{DateTime, Utc};
use depthbook_integration::{
    de::{de_opt_u64_epoch_ms_as_datetime_utc, de_str},
    protocol::websocket::{WsMessage, deserialise_payload},
};
use serde::{Deserialize, Serialize};

/// Event type carried by every `Binance` diff depth message.
pub const DEPTH_UPDATE_EVENT: &str = "depthUpdate";

/// [`Binance`](BinanceDepthDecoder) diff depth stream message.
///
/// ### Raw Payload Examples
/// See docs: <https://binance-docs.github.io/apidocs/spot/en/#diff-depth-stream>
/// ```json
/// {
///     "e": "depthUpdate",
///     "E": 1671656397761,
///     "s": "BTCUSDT",
///     "U": 157,
///     "u": 160,
///     "b": [
///         ["0.0024", "10"]
///     ],
///     "a": [
///         ["0.0026", "100"]
///     ]
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct BinanceDepthUpdate {
    #[serde(rename = "e")]
    pub event: String,
    #[serde(
        rename = "E",
        default,
        deserialize_with = "de_opt_u64_epoch_ms_as_datetime_utc"
    )]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
    #[serde(rename = "U", default)]
    pub first_update_id: Option<u64>,
    #[serde(rename = "u")]
    pub last_update_id: u64,
    #[serde(rename = "b")]
    pub bids: Vec<BinanceLevel>,
    #[serde(rename = "a")]
    pub asks: Vec<BinanceLevel>,
}

/// [`Binance`](BinanceDepthDecoder) price level, transmitted as a `["price", "quantity"]` pair.
///
/// A zero quantity removes the level.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct BinanceLevel {
    #[serde(deserialize_with = "de_str")]
    pub price: f64,
    #[serde(deserialize_with = "de_str")]
    pub amount: f64,
}

impl From<BinanceLevel> for RawLevel {
    fn from(level: BinanceLevel) -> Self {
        Self::new(level.price, level.amount)
    }
}

impl TryFrom<BinanceDepthUpdate> for DepthUpdate {
    type Error = DataError;

    fn try_from(update: BinanceDepthUpdate) -> Result<Self, Self::Error> {
        if update.event != DEPTH_UPDATE_EVENT {
            return Err(DataError::UnexpectedEvent(update.event));
        }

        Ok(Self {
            sequence: update.last_update_id,
            time: update.time.unwrap_or_else(Utc::now),
            bids: update.bids.into_iter().map(RawLevel::from).collect(),
            asks: update.asks.into_iter().map(RawLevel::from).collect(),
        })
    }
}

/// [`DepthDecoder`] for the `Binance` diff depth stream, used by both the live and synthetic
/// transports.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct BinanceDepthDecoder;

impl DepthDecoder for BinanceDepthDecoder {
    fn decode(&self, payload: &WsMessage) -> Result<DepthUpdate, DataError> {
        deserialise_payload::<BinanceDepthUpdate>(payload)?.try_into()
    }
}
