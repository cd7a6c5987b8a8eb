use async_trait::async_trait;

pub use kline_types::ConnectorKey;

use crate::types::{KlineError, Sample, SeriesRequest, Snapshot};

/// Focused role trait for connectors that provide OHLC price series.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Fetch samples for `symbol` over the request window, ordered by timestamp.
    ///
    /// An empty vector is a valid answer; connectors return
    /// `KlineError::NotFound` only when the provider explicitly says the
    /// symbol or window has no data.
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError>;
}

/// Focused role trait for connectors that provide a current-state snapshot.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch whatever snapshot fields the provider exposes for `symbol`.
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError>;
}

/// Main connector trait implemented by every data source.
///
/// Capabilities are advertised through the `as_*_provider` accessors; the
/// report driver asks for a capability and reports the source as
/// unavailable when the accessor returns `None`.
pub trait KlineConnector: Send + Sync {
    /// A stable identifier (e.g., "kline-yfinance").
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Advertise series capability by returning a usable trait object reference when supported.
    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        None
    }

    /// Advertise snapshot capability by returning a usable trait object reference when supported.
    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        None
    }

    /// Series capability, or `Unsupported`.
    ///
    /// # Errors
    /// Returns `KlineError::Unsupported` when the connector has no series capability.
    fn require_series(&self) -> Result<&dyn SeriesProvider, KlineError> {
        self.as_series_provider()
            .ok_or_else(|| KlineError::unsupported("series"))
    }

    /// Snapshot capability, or `Unsupported`.
    ///
    /// # Errors
    /// Returns `KlineError::Unsupported` when the connector has no snapshot capability.
    fn require_snapshot(&self) -> Result<&dyn SnapshotProvider, KlineError> {
        self.as_snapshot_provider()
            .ok_or_else(|| KlineError::unsupported("snapshot"))
    }
}
