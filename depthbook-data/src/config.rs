use crate::error::DataError;
use depthbook_integration::Validator;
use serde::{Deserialize, Serialize};
use url::Url;

/// Tick sizes offered to applications for display aggregation. Not enforced by the store.
pub const TICK_SIZE_CHOICES: [f64; 3] = [0.01, 0.1, 1.0];

/// Default Binance diff depth stream.
pub const DEFAULT_STREAM_URL: &str = "wss://stream.binance.com:9443/ws/btcusdt@depth";

/// Configuration of an [`OrderBookStore`](crate::store::OrderBookStore).
///
/// Every field is optional when deserialising, missing fields take their [`Default`] value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Aggregated levels per side in each published snapshot.
    pub depth: usize,
    /// Raw levels retained per side after each flush.
    pub max_raw_levels: usize,
    /// Decoded updates buffered between flushes before the oldest are dropped.
    pub max_pending_updates: usize,
    pub flush_interval_ms: u64,
    /// Initial aggregation tick size. Zero disables aggregation.
    pub tick_size: f64,
    pub stream_url: String,
    pub synthetic: SyntheticConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            depth: 25,
            max_raw_levels: 2000,
            max_pending_updates: 5000,
            flush_interval_ms: 100,
            tick_size: 0.1,
            stream_url: DEFAULT_STREAM_URL.to_string(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl Validator for StoreConfig {
    type Error = DataError;

    fn validate(self) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        require_non_zero("depth", self.depth as u64)?;
        require_non_zero("max_raw_levels", self.max_raw_levels as u64)?;
        require_non_zero("max_pending_updates", self.max_pending_updates as u64)?;
        require_non_zero("flush_interval_ms", self.flush_interval_ms)?;

        if !(self.tick_size.is_finite() && self.tick_size >= 0.0) {
            return Err(DataError::InvalidConfig(format!(
                "tick_size must be finite and non-negative, got: {}",
                self.tick_size
            )));
        }

        Url::parse(&self.stream_url).map_err(|error| {
            DataError::InvalidConfig(format!("stream_url {}: {error}", self.stream_url))
        })?;

        let synthetic = self.synthetic.validate()?;

        Ok(Self { synthetic, ..self })
    }
}

/// Configuration of the synthetic depth feed used when connecting with
/// [`ConnectConfig::use_mock`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub symbol: String,
    pub messages_per_second: u64,
    pub levels_per_side: usize,
    pub initial_mid: f64,
    /// Largest absolute move of the mid price between two messages.
    pub max_mid_step: f64,
    /// Seed for reproducible runs. Seeded from the OS if absent.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            messages_per_second: 140,
            levels_per_side: 20,
            initial_mid: 43_000.0,
            max_mid_step: 8.0,
            seed: None,
        }
    }
}

impl Validator for SyntheticConfig {
    type Error = DataError;

    fn validate(self) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        require_non_zero("synthetic.messages_per_second", self.messages_per_second)?;
        require_non_zero("synthetic.levels_per_side", self.levels_per_side as u64)?;

        if !(self.initial_mid.is_finite() && self.initial_mid > 0.0) {
            return Err(DataError::InvalidConfig(format!(
                "synthetic.initial_mid must be finite and positive, got: {}",
                self.initial_mid
            )));
        }

        if !(self.max_mid_step.is_finite() && self.max_mid_step >= 0.0) {
            return Err(DataError::InvalidConfig(format!(
                "synthetic.max_mid_step must be finite and non-negative, got: {}",
                self.max_mid_step
            )));
        }

        Ok(self)
    }
}

/// Per-session connection options passed to
/// [`OrderBookStore::connect`](crate::store::OrderBookStore::connect).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct ConnectConfig {
    /// Connect to the synthetic feed instead of the live exchange stream.
    pub use_mock: bool,
}

fn require_non_zero(field: &str, value: u64) -> Result<(), DataError> {
    if value == 0 {
        Err(DataError::InvalidConfig(format!("{field} must be non-zero")))
    } else {
        Ok(())
    }
}
