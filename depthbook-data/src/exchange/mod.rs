use crate::{books::DepthUpdate, error::DataError};
use depthbook_integration::protocol::websocket::WsMessage;
use std::fmt::Debug;

/// `Binance` spot diff depth stream decoder.
pub mod binance;

/// Decodes a raw feed payload into a normalised [`DepthUpdate`].
///
/// Failures are reported as [`DataError`]s, which the
/// [`OrderBookStore`](crate::store::OrderBookStore) drops after logging at debug level.
pub trait DepthDecoder: Debug + Send + Sync {
    fn decode(&self, payload: &WsMessage) -> Result<DepthUpdate, DataError>;
}
