/// Contains useful `WebSocket` type aliases, a connect helper, and utilities for turning a
/// [`WsMessage`](websocket::WsMessage) payload into text or a deserialised structure.
pub mod websocket;
