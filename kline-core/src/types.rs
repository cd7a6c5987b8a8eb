//! Sample, record, and snapshot types, plus re-exports of `kline-types`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use kline_types::{
    ConnectorKey, DEFAULT_MAX_RECORDS, DataSource, ExtendedHours, KlineError, ReportConfig, Step,
    Verbosity,
};

use crate::numeric::{MaybeNumeric, pct_change};

/// One provider bar. Any price may be absent when the provider reported null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Bar timestamp.
    pub ts: DateTime<Utc>,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
}

impl Sample {
    /// Build a sample with all four prices present.
    #[must_use]
    pub const fn new(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            ts,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    /// Build a sample from raw provider values, dropping anything non-finite.
    pub fn from_raw<T: MaybeNumeric>(ts: DateTime<Utc>, open: T, high: T, low: T, close: T) -> Self {
        Self {
            ts,
            open: open.as_finite(),
            high: high.as_finite(),
            low: low.as_finite(),
            close: close.as_finite(),
        }
    }

    /// True when none of the four prices carries a usable value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.open.as_finite().is_none()
            && self.high.as_finite().is_none()
            && self.low.as_finite().is_none()
            && self.close.as_finite().is_none()
    }
}

/// One aggregated bucket ("K-line").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcRecord {
    /// Bucket start.
    pub start: DateTime<Utc>,
    /// First usable open in arrival order.
    pub open: f64,
    /// Maximum high in the bucket.
    pub high: f64,
    /// Minimum low in the bucket.
    pub low: f64,
    /// Last usable close in arrival order.
    pub close: f64,
}

impl OhlcRecord {
    /// Percent change from open to close; 0 when the open is zero.
    #[must_use]
    pub fn pct_change(&self) -> f64 {
        pct_change(Some(self.open), Some(self.close)).unwrap_or(0.0)
    }

    /// True when the bucket closed above its open.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}

/// Sampling interval requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Interval {
    /// One-minute bars.
    Minute1,
    /// Daily bars.
    Day1,
}

/// Parameters for a series fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    /// Inclusive window start; `None` asks for the provider's full history.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive window end; `None` means "up to now".
    pub end: Option<DateTime<Utc>>,
    /// Bar interval.
    pub interval: Interval,
    /// Include pre-market and after-hours bars.
    pub include_prepost: bool,
}

impl SeriesRequest {
    /// One-minute bars for `[start, end)` including extended hours.
    #[must_use]
    pub const fn intraday(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            interval: Interval::Minute1,
            include_prepost: true,
        }
    }

    /// Daily bars over the longest window the provider serves.
    #[must_use]
    pub const fn full_daily_history() -> Self {
        Self {
            start: None,
            end: None,
            interval: Interval::Day1,
            include_prepost: false,
        }
    }
}

/// Named current-state quantities shown after the K-lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SnapshotField {
    /// Previous session close.
    PreviousClose,
    /// Regular session open.
    Open,
    /// Regular session high.
    DayHigh,
    /// Regular session low.
    DayLow,
    /// Latest trade price.
    CurrentPrice,
    /// Regular-session price (last regular trade).
    RegularMarketPrice,
    /// 52-week high.
    FiftyTwoWeekHigh,
    /// 52-week low.
    FiftyTwoWeekLow,
    /// Latest pre-market price.
    PreMarketPrice,
    /// Latest after-hours price.
    PostMarketPrice,
}

/// Snapshot of named fields from one ticker fetch. Absent fields are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    fields: BTreeMap<SnapshotField, f64>,
}

impl Snapshot {
    /// Empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `field` if it is a finite number; otherwise clear the field.
    pub fn set<T: MaybeNumeric + ?Sized>(&mut self, field: SnapshotField, value: &T) {
        match value.as_finite() {
            Some(v) => {
                self.fields.insert(field, v);
            }
            None => {
                self.fields.remove(&field);
            }
        }
    }

    /// Builder form of [`Snapshot::set`].
    #[must_use]
    pub fn with<T: MaybeNumeric>(mut self, field: SnapshotField, value: T) -> Self {
        self.set(field, &value);
        self
    }

    /// Value for `field`, if present.
    #[must_use]
    pub fn get(&self, field: SnapshotField) -> Option<f64> {
        self.fields.get(&field).copied()
    }

    /// Current price, falling back to the regular-market price.
    #[must_use]
    pub fn current_price(&self) -> Option<f64> {
        self.get(SnapshotField::CurrentPrice)
            .or_else(|| self.get(SnapshotField::RegularMarketPrice))
    }

    /// True when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Present fields in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (SnapshotField, f64)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, *v))
    }
}
