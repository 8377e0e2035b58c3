use crate::error::SocketError;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, connect_async,
    tungstenite::{client::IntoClientRequest, error::ProtocolError},
};
use tracing::debug;

/// Convenient type alias for a tungstenite `WebSocketStream`.
pub type WebSocket = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Communicative type alias for a tungstenite [`WebSocket`] `Message`.
pub type WsMessage = tokio_tungstenite::tungstenite::Message;

/// Communicative type alias for a tungstenite [`WebSocket`] `Error`.
pub type WsError = tokio_tungstenite::tungstenite::Error;

/// Connect asynchronously to a [`WebSocket`] server.
pub async fn connect<R>(request: R) -> Result<WebSocket, SocketError>
where
    R: IntoClientRequest + Unpin + Debug,
{
    debug!(?request, "attempting to establish WebSocket connection");
    connect_async(request)
        .await
        .map(|(websocket, _)| websocket)
        .map_err(SocketError::from)
}

/// Determine whether a [`WsError`] indicates the [`WebSocket`] has disconnected.
pub fn is_websocket_disconnected(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Io(_)
            | WsError::Protocol(ProtocolError::SendAfterClosing)
    )
}

/// Short name of the [`WsMessage`] variant, used in logs and errors.
pub fn message_kind(message: &WsMessage) -> &'static str {
    match message {
        WsMessage::Text(_) => "Text",
        WsMessage::Binary(_) => "Binary",
        WsMessage::Ping(_) => "Ping",
        WsMessage::Pong(_) => "Pong",
        WsMessage::Close(_) => "Close",
        WsMessage::Frame(_) => "Frame",
    }
}

/// Extract the textual payload of a [`WsMessage`].
///
/// Binary payloads are accepted if they are valid UTF-8. Control frames carry no payload and are
/// rejected with [`SocketError::Unsupported`].
pub fn payload_text(message: &WsMessage) -> Result<&str, SocketError> {
    match message {
        WsMessage::Text(text) => Ok(text.as_str()),
        WsMessage::Binary(binary) => std::str::from_utf8(binary).map_err(SocketError::from),
        other => Err(SocketError::Unsupported {
            entity: "WebSocket payload",
            item: message_kind(other).to_string(),
        }),
    }
}

/// Deserialise the JSON payload of a [`WsMessage`] into the desired `Output`.
pub fn deserialise_payload<Output>(message: &WsMessage) -> Result<Output, SocketError>
where
    Output: DeserializeOwned,
{
    let payload = payload_text(message)?;
    serde_json::from_str::<Output>(payload).map_err(|error| {
        debug!(
            ?error,
            payload,
            action = "returning Err(SocketError::Deserialise)",
            "failed to deserialize WebSocket Message into domain specific Message"
        );
        SocketError::Deserialise {
            error,
            payload: payload.to_string(),
        }
    })
}
