//! Offline connector serving deterministic bars and snapshots.
//!
//! Known symbols are `NVDA`, `AAPL` and `MSFT`. Two symbols are reserved:
//! `FAIL` always returns a connector error and `EMPTY` always returns no bars.
//! Any other symbol is reported as not found.

use async_trait::async_trait;
use chrono::NaiveDate;
use kline_core::connector::{ConnectorKey, KlineConnector, SeriesProvider, SnapshotProvider};
use kline_core::{Interval, KlineError, Sample, SeriesRequest, Snapshot, TradingCalendar};

mod fixtures;

pub use fixtures::DAILY_HISTORY_LEN;

/// Mock connector for tests and offline runs. Every answer is a pure function
/// of the symbol and the request.
#[derive(Debug, Clone, Copy)]
pub struct MockConnector {
    calendar: TradingCalendar,
    last_session: NaiveDate,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("kline-mock");

    /// Last trading day of the default daily history (a Friday).
    pub const DEFAULT_LAST_SESSION: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 5) {
        Some(d) => d,
        None => NaiveDate::MIN,
    };

    #[must_use]
    pub const fn new() -> Self {
        Self {
            calendar: TradingCalendar::us_equities(),
            last_session: Self::DEFAULT_LAST_SESSION,
        }
    }

    /// Serve daily history ending at `date` instead of the default.
    #[must_use]
    pub const fn with_last_session(mut self, date: NaiveDate) -> Self {
        self.last_session = date;
        self
    }

    fn check(symbol: &str, capability: &'static str) -> Result<(), KlineError> {
        if symbol == "FAIL" {
            return Err(KlineError::connector(
                Self::KEY.as_str(),
                format!("forced failure: {capability}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SeriesProvider for MockConnector {
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        Self::check(symbol, "series")?;
        if symbol == "EMPTY" {
            return Ok(Vec::new());
        }
        let base = fixtures::base_price(symbol)
            .ok_or_else(|| KlineError::not_found(format!("series for {symbol}")))?;

        let rows = match req.interval {
            Interval::Minute1 => {
                let (day_start, day_end) = self.calendar.day_bounds(self.last_session);
                fixtures::minute_bars(
                    &self.calendar,
                    base,
                    req.start.unwrap_or(day_start),
                    req.end.unwrap_or(day_end),
                )
            }
            _ => fixtures::daily_bars(&self.calendar, base, self.last_session)
                .into_iter()
                .filter(|s| req.start.is_none_or(|t| s.ts >= t))
                .filter(|s| req.end.is_none_or(|t| s.ts < t))
                .collect(),
        };
        Ok(rows)
    }
}

#[async_trait]
impl SnapshotProvider for MockConnector {
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError> {
        Self::check(symbol, "snapshot")?;
        if symbol == "EMPTY" {
            return Ok(Snapshot::new());
        }
        fixtures::snapshot(symbol)
            .ok_or_else(|| KlineError::not_found(format!("snapshot for {symbol}")))
    }
}

impl KlineConnector for MockConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }

    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        Some(self as &dyn SnapshotProvider)
    }
}
