use crate::{
    books::snapshot::FeedSource,
    config::{StoreConfig, SyntheticConfig},
    error::DataError,
    transport::{live::WebSocketTransport, synthetic::SyntheticTransport},
};
use depthbook_integration::{
    error::SocketError,
    transport::{Transport, TransportHandler},
};
use std::{fmt::Debug, sync::Arc};
use url::Url;

/// [`WebSocketTransport`] streaming a live exchange feed.
pub mod live;

/// [`SyntheticTransport`] emitting generated `Binance` format depth updates.
pub mod synthetic;

/// Opens a new [`Transport`] session for a [`FeedSource`], delivering its events to the provided
/// [`TransportHandler`].
///
/// Must be called from within a Tokio runtime.
pub trait Connector: Debug + Send + Sync + 'static {
    fn connect(&self, source: FeedSource, handler: Arc<dyn TransportHandler>) -> Box<dyn Transport>;
}

/// All [`Transport`]s the [`DefaultConnector`] can open.
#[derive(Debug)]
pub enum TransportKind {
    Live(WebSocketTransport),
    Synthetic(SyntheticTransport),
}

impl Transport for TransportKind {
    fn close(&mut self) -> Result<(), SocketError> {
        match self {
            Self::Live(transport) => transport.close(),
            Self::Synthetic(transport) => transport.close(),
        }
    }
}

/// [`Connector`] opening a [`WebSocketTransport`] for [`FeedSource::Binance`] and a
/// [`SyntheticTransport`] for [`FeedSource::Mock`].
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultConnector {
    pub stream_url: Url,
    pub synthetic: SyntheticConfig,
}

impl DefaultConnector {
    pub fn new(stream_url: Url, synthetic: SyntheticConfig) -> Self {
        Self {
            stream_url,
            synthetic,
        }
    }

    pub fn open(&self, source: FeedSource, handler: Arc<dyn TransportHandler>) -> TransportKind {
        match source {
            FeedSource::Binance => {
                TransportKind::Live(WebSocketTransport::open(self.stream_url.clone(), handler))
            }
            FeedSource::Mock => {
                TransportKind::Synthetic(SyntheticTransport::open(&self.synthetic, handler))
            }
        }
    }
}

impl TryFrom<&StoreConfig> for DefaultConnector {
    type Error = DataError;

    fn try_from(config: &StoreConfig) -> Result<Self, Self::Error> {
        let stream_url = Url::parse(&config.stream_url).map_err(|error| {
            DataError::InvalidConfig(format!("stream_url {}: {error}", config.stream_url))
        })?;

        Ok(Self::new(stream_url, config.synthetic.clone()))
    }
}

impl Connector for DefaultConnector {
    fn connect(&self, source: FeedSource, handler: Arc<dyn TransportHandler>) -> Box<dyn Transport> {
        Box::new(self.open(source, handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthbook_integration::protocol::websocket::WsMessage;

    #[derive(Debug)]
    struct NoopHandler;

    impl TransportHandler for NoopHandler {
        fn on_open(&self) {}

        fn on_close(&self) {}

        fn on_error(&self) {}

        fn on_message(&self, _: WsMessage) {}
    }

    #[test]
    fn test_default_connector_try_from_store_config() {
        let connector = DefaultConnector::try_from(&StoreConfig::default()).unwrap();
        assert_eq!(connector.stream_url.host_str(), Some("stream.binance.com"));

        let invalid = StoreConfig {
            stream_url: "::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            DefaultConnector::try_from(&invalid),
            Err(DataError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_connector_selects_transport_by_source() {
        let connector = DefaultConnector::try_from(&StoreConfig::default()).unwrap();

        let mut transport = connector.open(FeedSource::Mock, Arc::new(NoopHandler));
        assert!(matches!(transport, TransportKind::Synthetic(_)));
        assert!(transport.close().is_ok());
        assert!(transport.close().is_err());
    }
}
