#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::pedantic, clippy::type_complexity)]
#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    rust_2018_idioms
)]

//! # Depthbook-Data
//! Maintains a live, depth-aggregated limit order book from a stream of sequenced incremental
//! price level updates, and republishes a consistent, tick-size bucketed snapshot to any number
//! of observers at a bounded rate. It is:
//! * **Batched**: decoded deltas are only enqueued on arrival; a periodic flush applies them to
//!   the raw book, prunes it and rebuilds the published [`OrderBookSnapshot`](books::snapshot::OrderBookSnapshot).
//! * **Drift Aware**: forward sequence gaps are surfaced in every snapshot as a
//!   [`Drift`](books::sequencer::Drift), without attempting resynchronisation.
//! * **Source Agnostic**: a live Binance WebSocket feed and a synthetic generator are
//!   interchangeable behind the [`Connector`](transport::Connector) trait.
//!
//! ## User API
//! - [`OrderBookStore`](store::OrderBookStore) is constructed from a [`StoreConfig`](config::StoreConfig).
//! - [`OrderBookStore::connect`](store::OrderBookStore::connect) opens a feed session,
//!   [`OrderBookStore::disconnect`](store::OrderBookStore::disconnect) tears it down.
//! - [`OrderBookStore::subscribe`](store::OrderBookStore::subscribe) registers an observer that is
//!   handed every newly built snapshot.
//!
//! ### Synthetic Feed
//! ```rust,no_run
//! use depthbook_data::{
//!     config::{ConnectConfig, StoreConfig},
//!     store::OrderBookStore,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = OrderBookStore::new(StoreConfig::default()).unwrap();
//!
//!     let _subscription = store.subscribe(|snapshot| {
//!         println!("best bid: {:?}, best ask: {:?}", snapshot.best_bid, snapshot.best_ask);
//!     });
//!
//!     store.connect(ConnectConfig { use_mock: true });
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     store.disconnect();
//! }
//! ```

/// All [`Error`](std::error::Error)s generated in Depthbook-Data.
pub mod error;

/// Serde configuration types for the [`OrderBookStore`](store::OrderBookStore) and its feeds.
pub mod config;

/// Default `tracing` subscriber initialisation.
pub mod logging;

/// Order book engine components: raw book state, tick-size aggregation, sequence tracking,
/// pending update buffer and snapshot building.
pub mod books;

/// Exchange specific payload decoders that normalise raw feed messages into
/// [`DepthUpdate`](books::DepthUpdate)s.
pub mod exchange;

/// Live WebSocket and synthetic [`Transport`](depthbook_integration::transport::Transport)
/// implementations, and the [`Connector`](transport::Connector) that selects between them.
pub mod transport;

/// The [`OrderBookStore`](store::OrderBookStore), its flush scheduler and observer registry.
pub mod store;
