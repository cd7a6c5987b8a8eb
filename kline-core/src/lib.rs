//! kline-core
//!
//! Core types, traits, and utilities shared across the kline workspace.
//!
//! - `types`: samples, resampled records, and the snapshot field vocabulary.
//! - `connector`: the `KlineConnector` trait and its capability traits.
//! - `numeric`: guards that keep absent or non-finite provider values out of arithmetic.
//! - `session`: the US equities trading calendar and market-phase classifier.
//! - `timeseries`: session segmentation and fixed-width resampling.
//! - `format`: fixed-column rendering of K-lines and the snapshot block.
//!
//! Nothing in this crate reads the wall clock; "now" is always a parameter.
#![warn(missing_docs)]

/// Connector capability traits and the primary `KlineConnector` interface.
pub mod connector;
/// Text rendering for K-line rows and snapshot lines.
pub mod format;
/// Numeric guards for provider-sourced values.
pub mod numeric;
/// Trading calendar and market-phase classification.
pub mod session;
/// Time-series utilities for segmentation and resampling.
pub mod timeseries;
/// Samples, records, snapshots, and shared configuration types.
pub mod types;

pub use connector::{KlineConnector, SeriesProvider, SnapshotProvider};
pub use format::{
    LineFormatter, TimeLabel, format_kline, format_snapshot, signed_pct, snapshot_header,
};
pub use numeric::{MaybeNumeric, format_or_placeholder, format_price, is_numeric, pct_change};
pub use session::{MarketPhase, Session, TradingCalendar};
pub use timeseries::resample::{BucketOrigin, resample_to_days, resample_to_minutes, tail};
pub use timeseries::segment::{SessionSplit, segment};
pub use types::*;
