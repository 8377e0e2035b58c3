#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, type_alias_bounds)]

//! # Depthbook-Integration
//! Low-level plumbing for consuming streaming order book feeds.
//!
//! Utilised by `depthbook-data` to open and drive feed connections without knowing whether the
//! bytes come from a real exchange socket or a synthetic generator. It provides:
//! * **Transport**: a [`Transport`](transport::Transport) capability (`close`) paired with a
//!   [`TransportHandler`](transport::TransportHandler) receiving the four session events
//!   (open, close, error, message).
//! * **WebSocket**: tungstenite type aliases, a connect helper and payload utilities.
//! * **Errors**: the [`SocketError`](error::SocketError) produced by socket IO.

/// All [`Error`](std::error::Error)s generated in Depthbook-Integration.
pub mod error;

/// Contains WebSocket type aliases and helpers for connecting and extracting payload text.
pub mod protocol;

/// [`Transport`](transport::Transport) and [`TransportHandler`](transport::TransportHandler)
/// traits that every feed connection (live or synthetic) is expressed through.
pub mod transport;

/// Utilities to assist deserialisation.
pub mod de;

/// [`Validator`]s are capable of determining if their internal state is satisfactory to fulfill
/// some use case defined by the implementor.
pub trait Validator {
    type Error;

    /// Check if `Self` is valid for some use case.
    fn validate(self) -> Result<Self, Self::Error>
    where
        Self: Sized;
}
