use depthbook_integration::{
    error::SocketError,
    protocol::websocket::{WsMessage, connect, is_websocket_disconnected},
    transport::{Transport, TransportHandler},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

/// [`Transport`] forwarding every text and binary frame of a WebSocket session to a
/// [`TransportHandler`].
///
/// The session is driven by a spawned task. [`Transport::close`] signals that task to send a
/// close frame and exit without invoking any further handler callbacks.
#[derive(Debug)]
pub struct WebSocketTransport {
    url: Url,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl WebSocketTransport {
    /// Spawn a task connecting to `url` and driving the session.
    pub fn open(url: Url, handler: Arc<dyn TransportHandler>) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(run(url.clone(), handler, shutdown_rx));

        Self {
            url,
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Transport for WebSocketTransport {
    fn close(&mut self) -> Result<(), SocketError> {
        let shutdown_tx = self
            .shutdown_tx
            .take()
            .ok_or_else(|| SocketError::Terminated(format!("{} already closed", self.url)))?;

        shutdown_tx
            .send(())
            .map_err(|_| SocketError::Terminated(format!("{} session already ended", self.url)))
    }
}

async fn run(url: Url, handler: Arc<dyn TransportHandler>, mut shutdown_rx: oneshot::Receiver<()>) {
    let websocket = tokio::select! {
        biased;
        _ = &mut shutdown_rx => {
            debug!(%url, "WebSocket closed before connection was established");
            return;
        }
        connection = connect(url.as_str()) => match connection {
            Ok(websocket) => websocket,
            Err(error) => {
                warn!(%url, %error, "failed to connect WebSocket");
                handler.on_error();
                handler.on_close();
                return;
            }
        }
    };

    info!(%url, "WebSocket connected");
    handler.on_open();

    let (mut ws_sink, mut ws_stream) = websocket.split();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                if let Err(error) = ws_sink.send(WsMessage::Close(None)).await {
                    debug!(%url, %error, "failed to send WebSocket close frame");
                }
                info!(%url, "WebSocket closed");
                return;
            }
            message = ws_stream.next() => match message {
                Some(Ok(payload @ (WsMessage::Text(_) | WsMessage::Binary(_)))) => {
                    handler.on_message(payload);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    info!(%url, ?frame, "WebSocket closed by server");
                    handler.on_close();
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(
                        %url,
                        %error,
                        disconnected = is_websocket_disconnected(&error),
                        "WebSocket read error"
                    );
                    handler.on_error();
                    handler.on_close();
                    return;
                }
                None => {
                    info!(%url, "WebSocket stream ended");
                    handler.on_close();
                    return;
                }
            }
        }
    }
}
