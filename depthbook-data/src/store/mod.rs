use crate::{
    books::{
        buffer::UpdateBuffer,
        raw::RawBook,
        sequencer::SequenceTracker,
        snapshot::{ConnectionStatus, FeedSource, OrderBookSnapshot, SnapshotBuilder},
    },
    config::{ConnectConfig, StoreConfig},
    error::DataError,
    exchange::{DepthDecoder, binance::BinanceDepthDecoder},
    transport::{Connector, DefaultConnector},
};
use depthbook_integration::{
    Validator,
    protocol::websocket::WsMessage,
    transport::{Transport, TransportHandler},
};
use parking_lot::{Mutex, RwLock};
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Periodic flush trigger.
pub mod scheduler;

/// Observer registry.
pub mod hub;

pub use hub::SubscriptionHandle;
use hub::SubscriptionHub;
use scheduler::FlushScheduler;

/// Live, depth-aggregated order book fed by a single [`Transport`] session at a time.
///
/// Cheaply cloneable handle, all clones share the same book. Inbound messages are only decoded
/// and buffered; a periodic flush applies them to the raw book, prunes it, and publishes a new
/// [`OrderBookSnapshot`] to every subscriber.
///
/// Methods that open a session or start the flush scheduler must be called from within a Tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct OrderBookStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    config: StoreConfig,
    connector: Box<dyn Connector>,
    decoder: Box<dyn DepthDecoder>,
    builder: SnapshotBuilder,
    engine: Mutex<Engine>,
    snapshot: RwLock<Arc<OrderBookSnapshot>>,
    hub: SubscriptionHub<OrderBookSnapshot>,
}

/// All mutable state of the store, guarded by a single lock so that a flush and a message
/// callback never interleave.
#[derive(Debug)]
struct Engine {
    book: RawBook,
    pending: UpdateBuffer,
    sequencer: SequenceTracker,
    tick_size: f64,
    status: ConnectionStatus,
    source: FeedSource,
    session: Option<u64>,
    next_session: u64,
    published: u64,
    transport: Option<Box<dyn Transport>>,
    scheduler: FlushScheduler,
}

impl OrderBookStore {
    /// Construct an [`OrderBookStore`] streaming from the live `Binance` feed or the synthetic
    /// feed described by the [`StoreConfig`].
    pub fn new(config: StoreConfig) -> Result<Self, DataError> {
        let connector = DefaultConnector::try_from(&config)?;
        Self::with_components(config, connector, BinanceDepthDecoder)
    }

    /// Construct an [`OrderBookStore`] with a custom [`Connector`] and [`DepthDecoder`].
    pub fn with_components<C, D>(
        config: StoreConfig,
        connector: C,
        decoder: D,
    ) -> Result<Self, DataError>
    where
        C: Connector,
        D: DepthDecoder + 'static,
    {
        let config = config.validate()?;

        let engine = Engine {
            book: RawBook::default(),
            pending: UpdateBuffer::new(config.max_pending_updates),
            sequencer: SequenceTracker::default(),
            tick_size: config.tick_size,
            status: ConnectionStatus::Closed,
            source: FeedSource::default(),
            session: None,
            next_session: 0,
            published: 0,
            transport: None,
            scheduler: FlushScheduler::default(),
        };

        Ok(Self {
            inner: Arc::new(StoreInner {
                builder: SnapshotBuilder::new(config.depth),
                snapshot: RwLock::new(Arc::new(OrderBookSnapshot::empty(config.tick_size))),
                config,
                connector: Box::new(connector),
                decoder: Box::new(decoder),
                engine: Mutex::new(engine),
                hub: SubscriptionHub::default(),
            }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Register a listener invoked with every newly built [`OrderBookSnapshot`].
    ///
    /// Listeners run synchronously on the thread that triggered the rebuild, after the store's
    /// internal lock has been released. Concurrent rebuilds are delivered in publication order,
    /// and a snapshot superseded before its delivery started is skipped.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionHandle<OrderBookSnapshot>
    where
        F: Fn(Arc<OrderBookSnapshot>) + Send + Sync + 'static,
    {
        self.inner.hub.subscribe(listener)
    }

    /// Most recently published [`OrderBookSnapshot`].
    pub fn snapshot(&self) -> Arc<OrderBookSnapshot> {
        Arc::clone(&self.inner.snapshot.read())
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.engine.lock().status
    }

    pub fn tick_size(&self) -> f64 {
        self.inner.engine.lock().tick_size
    }

    /// Number of decoded updates awaiting the next flush.
    pub fn pending_len(&self) -> usize {
        self.inner.engine.lock().pending.len()
    }

    /// Change the aggregation tick size, immediately rebuilding and publishing the snapshot.
    ///
    /// A tick size that is not strictly positive disables aggregation.
    pub fn set_tick_size(&self, tick_size: f64) {
        self.update(|engine| {
            debug!(tick_size, "changing order book tick size");
            engine.tick_size = tick_size;
        });
    }

    /// Open a new feed session, tearing down any existing one first.
    ///
    /// Clears the raw book, pending updates and any recorded drift. Callbacks from every
    /// previous session are ignored from this point on.
    pub fn connect(&self, config: ConnectConfig) {
        let (session, source) = self.update(|engine| {
            engine.teardown();
            engine.sequencer.reset();

            engine.source = if config.use_mock {
                FeedSource::Mock
            } else {
                FeedSource::Binance
            };
            engine.status = ConnectionStatus::Connecting;

            let session = engine.next_session;
            engine.next_session += 1;
            engine.session = Some(session);

            info!(session, source = %engine.source, "connecting order book feed");
            (session, engine.source)
        });

        let handler = Arc::new(StoreHandler {
            store: Arc::downgrade(&self.inner),
            session,
        });
        let mut transport = self.inner.connector.connect(source, handler);

        let mut engine = self.inner.engine.lock();
        if engine.session == Some(session) {
            engine.transport = Some(transport);
        } else {
            drop(engine);
            debug!(session, "session superseded while connecting, closing its transport");
            if let Err(error) = transport.close() {
                debug!(session, %error, "failed to close superseded transport");
            }
        }
    }

    /// Tear down the current feed session, if any, and publish an empty `closed` snapshot.
    ///
    /// Safe to call when already disconnected.
    pub fn disconnect(&self) {
        self.update(|engine| {
            info!(session = ?engine.session, "disconnecting order book feed");
            engine.teardown();
            engine.status = ConnectionStatus::Closed;
        });
    }

    /// Run one flush cycle: apply every pending update in arrival order, prune the raw book and
    /// publish a new snapshot.
    ///
    /// Returns `false` without publishing if there was nothing to apply.
    pub fn flush(&self) -> bool {
        let (version, snapshot) = {
            let mut engine = self.inner.engine.lock();
            if engine.pending.is_empty() {
                return false;
            }

            for update in engine.pending.drain_all() {
                engine.book.apply_update(update);
            }
            engine.book.prune(self.inner.config.max_raw_levels);

            self.inner.publish(&mut engine)
        };

        self.inner.hub.notify(version, snapshot);
        true
    }

    /// Mutate the engine, then publish and notify the rebuilt snapshot.
    fn update<F, Output>(&self, mutate: F) -> Output
    where
        F: FnOnce(&mut Engine) -> Output,
    {
        let (output, (version, snapshot)) = {
            let mut engine = self.inner.engine.lock();
            let output = mutate(&mut engine);
            (output, self.inner.publish(&mut engine))
        };

        self.inner.hub.notify(version, snapshot);
        output
    }

    /// Mutate the engine only if `session` is still current, then publish and notify.
    fn update_session<F>(&self, session: u64, mutate: F)
    where
        F: FnOnce(&mut Engine),
    {
        let (version, snapshot) = {
            let mut engine = self.inner.engine.lock();
            if engine.session != Some(session) {
                debug!(session, "ignoring event from stale session");
                return;
            }
            mutate(&mut engine);
            self.inner.publish(&mut engine)
        };

        self.inner.hub.notify(version, snapshot);
    }

    fn handle_open(&self, session: u64) {
        let store = Arc::downgrade(&self.inner);
        let period = Duration::from_millis(self.inner.config.flush_interval_ms);

        self.update_session(session, move |engine| {
            info!(session, source = %engine.source, "order book feed open");
            engine.status = ConnectionStatus::Open;
            engine.scheduler.start(period, move || flush_tick(&store));
        });
    }

    fn handle_close(&self, session: u64) {
        self.update_session(session, |engine| {
            info!(session, source = %engine.source, "order book feed closed");
            engine.status = ConnectionStatus::Closed;
            engine.scheduler.stop();
        });
    }

    fn handle_error(&self, session: u64) {
        self.update_session(session, |engine| {
            warn!(session, source = %engine.source, "order book feed error");
            engine.status = ConnectionStatus::Error;
        });
    }

    fn handle_message(&self, session: u64, payload: WsMessage) {
        let update = match self.inner.decoder.decode(&payload) {
            Ok(update) => update,
            Err(error) => {
                debug!(session, %error, "dropping undecodable feed message");
                return;
            }
        };

        let mut engine = self.inner.engine.lock();
        if engine.session != Some(session) {
            return;
        }

        engine.sequencer.observe(update.sequence);
        engine.pending.enqueue(update);
    }
}

impl StoreInner {
    /// Build a snapshot from the current engine state and make it the published one, returning
    /// it with its publication version.
    ///
    /// Called with the engine lock held, so version order matches mutation order.
    fn publish(&self, engine: &mut Engine) -> (u64, Arc<OrderBookSnapshot>) {
        engine.published += 1;

        let snapshot = Arc::new(self.builder.build(
            &engine.book,
            engine.tick_size,
            engine.status,
            engine.source,
            engine.sequencer.drift(),
        ));

        *self.snapshot.write() = Arc::clone(&snapshot);
        (engine.published, snapshot)
    }
}

impl Engine {
    /// Stop the scheduler, close the transport and clear all book state. Status is left as is.
    fn teardown(&mut self) {
        self.scheduler.stop();

        if let Some(mut transport) = self.transport.take()
            && let Err(error) = transport.close()
        {
            debug!(%error, "transport close failed, treating as closed");
        }

        self.session = None;
        self.pending.clear();
        self.book.clear();
    }
}

fn flush_tick(store: &Weak<StoreInner>) -> bool {
    match store.upgrade() {
        Some(inner) => {
            OrderBookStore { inner }.flush();
            true
        }
        None => false,
    }
}

/// [`TransportHandler`] routing the events of one session back into the store.
#[derive(Debug)]
struct StoreHandler {
    store: Weak<StoreInner>,
    session: u64,
}

impl StoreHandler {
    fn store(&self) -> Option<OrderBookStore> {
        self.store.upgrade().map(|inner| OrderBookStore { inner })
    }
}

impl TransportHandler for StoreHandler {
    fn on_open(&self) {
        if let Some(store) = self.store() {
            store.handle_open(self.session);
        }
    }

    fn on_close(&self) {
        if let Some(store) = self.store() {
            store.handle_close(self.session);
        }
    }

    fn on_error(&self) {
        if let Some(store) = self.store() {
            store.handle_error(self.session);
        }
    }

    fn on_message(&self, payload: WsMessage) {
        if let Some(store) = self.store() {
            store.handle_message(self.session, payload);
        }
    }
}
