use crate::{error::SocketError, protocol::websocket::WsMessage};
use std::fmt::Debug;

/// Receiver of the events produced by a single [`Transport`] session.
///
/// A [`Transport`] implementation invokes these from its own task:
/// - `on_open` once the session is established,
/// - `on_message` for every inbound payload,
/// - `on_error` when the session fails,
/// - `on_close` when the session ends without [`Transport::close`] having been called.
///
/// After [`Transport::close`] returns, no further methods are invoked.
pub trait TransportHandler: Send + Sync + 'static {
    fn on_open(&self);

    fn on_close(&self);

    fn on_error(&self);

    fn on_message(&self, payload: WsMessage);
}

/// A live feed session (eg/ a WebSocket connection or a synthetic generator) feeding a
/// [`TransportHandler`].
pub trait Transport: Debug + Send {
    /// Terminate the session.
    ///
    /// Returns an error if the session had already ended, in which case the caller should
    /// consider it closed.
    fn close(&mut self) -> Result<(), SocketError>;
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn close(&mut self) -> Result<(), SocketError> {
        (**self).close()
    }
}
