//! kline-yfinance
//!
//! Public connector that implements `KlineConnector` using the `yfinance-rs`
//! client library. Series come from the chart history service as one-minute
//! or daily candles. The snapshot starts from the quote (price and previous
//! close) and fills the day range, session prices and 52-week range from
//! today's one-minute candles and a year of daily candles.
//! No API key is required.
#![warn(missing_docs)]

/// Provider adapters (history and quotes) and the production `RealAdapter`.
pub mod adapter;

use std::sync::Arc;

#[cfg(feature = "test-adapters")]
use adapter::CloneArcAdapters;
use adapter::{RealAdapter, YfHistory, YfQuotes};
use async_trait::async_trait;
use chrono::Utc;
use kline_core::{
    Interval, KlineError, Sample, SeriesRequest, Session, Snapshot, SnapshotField,
    TradingCalendar,
    connector::{ConnectorKey, KlineConnector, SeriesProvider, SnapshotProvider},
};
use yf::core::conversions::money_to_f64;
use yf::core::services::HistoryRequest;
use yfinance_rs as yf;

#[cfg(not(feature = "test-adapters"))]
type AdapterArc = Arc<RealAdapter>;

#[cfg(feature = "test-adapters")]
type HistoryAdapter = Arc<dyn YfHistory>;
#[cfg(not(feature = "test-adapters"))]
type HistoryAdapter = AdapterArc;

#[cfg(feature = "test-adapters")]
type QuotesAdapter = Arc<dyn YfQuotes>;
#[cfg(not(feature = "test-adapters"))]
type QuotesAdapter = AdapterArc;

/// Public connector type. Production users construct with `YfConnector::try_new_default()`.
pub struct YfConnector {
    history: HistoryAdapter,
    quotes: QuotesAdapter,
    calendar: TradingCalendar,
}

impl YfConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("kline-yfinance");

    /// Build with a fresh `yfinance_rs::YfClient` inside.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client cannot be constructed.
    pub fn try_new_default() -> Result<Self, KlineError> {
        Ok(Self::from_adapter(&RealAdapter::try_new_default()?))
    }

    /// Build from an existing `yfinance_rs::YfClient`.
    #[must_use]
    pub fn new_with_client(client: yf::YfClient) -> Self {
        Self::from_adapter(&RealAdapter::new(client))
    }

    /// For tests/injection (requires the `test-adapters` feature).
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter<A: CloneArcAdapters + 'static>(adapter: &A) -> Self {
        Self {
            history: adapter.clone_arc_history(),
            quotes: adapter.clone_arc_quotes(),
            calendar: TradingCalendar::us_equities(),
        }
    }

    #[cfg(not(feature = "test-adapters"))]
    /// Build from a concrete `RealAdapter` by cloning it into shared handles.
    pub fn from_adapter(adapter: &RealAdapter) -> Self {
        let shared = Arc::new(adapter.clone());
        Self {
            history: Arc::clone(&shared),
            quotes: shared,
            calendar: TradingCalendar::us_equities(),
        }
    }

    fn history_request(req: &SeriesRequest) -> HistoryRequest {
        let interval = match req.interval {
            Interval::Minute1 => yf::Interval::I1m,
            _ => yf::Interval::D1,
        };
        let (range, period) = match req.start {
            Some(start) => {
                let end = req.end.unwrap_or_else(Utc::now);
                (None, Some((start.timestamp(), end.timestamp())))
            }
            None => (Some(yf::Range::Max), None),
        };
        HistoryRequest {
            range,
            period,
            interval,
            include_prepost: req.include_prepost,
            include_actions: false,
            auto_adjust: true,
            keepna: false,
        }
    }

    const fn ranged_request(range: yf::Range, interval: yf::Interval, prepost: bool) -> HistoryRequest {
        HistoryRequest {
            range: Some(range),
            period: None,
            interval,
            include_prepost: prepost,
            include_actions: false,
            auto_adjust: true,
            keepna: false,
        }
    }

    /// Candles for a snapshot enrichment; an empty result is not an error.
    async fn optional_candles(
        &self,
        symbol: &str,
        req: HistoryRequest,
    ) -> Result<Vec<yf::Candle>, KlineError> {
        match self.history.fetch_full(symbol, req).await {
            Ok(resp) => Ok(resp.candles),
            Err(e) if e.is_empty_result() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

fn candle_to_sample(c: &yf::Candle) -> Sample {
    Sample::new(
        c.ts,
        money_to_f64(&c.open),
        money_to_f64(&c.high),
        money_to_f64(&c.low),
        money_to_f64(&c.close),
    )
}

/// Open and range of the regular session plus the latest pre/after-hours closes.
fn apply_session_prices(snap: &mut Snapshot, calendar: &TradingCalendar, candles: &[yf::Candle]) {
    let mut open = None;
    let mut high: Option<f64> = None;
    let mut low: Option<f64> = None;
    let mut pre = None;
    let mut post = None;
    for c in candles {
        let s = candle_to_sample(c);
        match calendar.session_at(s.ts) {
            Some(Session::Regular) => {
                open = open.or(s.open);
                if let Some(h) = s.high {
                    high = Some(high.map_or(h, |m| m.max(h)));
                }
                if let Some(l) = s.low {
                    low = Some(low.map_or(l, |m| m.min(l)));
                }
            }
            Some(Session::PreMarket) => pre = s.close.or(pre),
            Some(Session::AfterHours) => post = s.close.or(post),
            None => {}
        }
    }
    snap.set(SnapshotField::Open, &open);
    snap.set(SnapshotField::DayHigh, &high);
    snap.set(SnapshotField::DayLow, &low);
    snap.set(SnapshotField::PreMarketPrice, &pre);
    snap.set(SnapshotField::PostMarketPrice, &post);
}

fn apply_year_range(snap: &mut Snapshot, candles: &[yf::Candle]) {
    let high = candles
        .iter()
        .map(|c| money_to_f64(&c.high))
        .reduce(f64::max);
    let low = candles
        .iter()
        .map(|c| money_to_f64(&c.low))
        .reduce(f64::min);
    snap.set(SnapshotField::FiftyTwoWeekHigh, &high);
    snap.set(SnapshotField::FiftyTwoWeekLow, &low);
}

#[async_trait]
impl SeriesProvider for YfConnector {
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        let yf_req = Self::history_request(&req);
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "kline::yfinance", symbol, ?yf_req, "fetching history");
        let raw = self.history.fetch_full(symbol, yf_req).await?;
        let mut rows: Vec<Sample> = raw.candles.iter().map(candle_to_sample).collect();
        rows.sort_by_key(|s| s.ts);
        Ok(rows)
    }
}

#[async_trait]
impl SnapshotProvider for YfConnector {
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError> {
        let quote = self
            .quotes
            .fetch(std::slice::from_ref(&symbol.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KlineError::not_found(format!("quote for {symbol}")))?;
        let price = quote.price.as_ref().map(money_to_f64);
        let mut snap = Snapshot::new()
            .with(
                SnapshotField::PreviousClose,
                quote.previous_close.as_ref().map(money_to_f64),
            )
            .with(SnapshotField::CurrentPrice, price)
            .with(SnapshotField::RegularMarketPrice, price);

        let today = self
            .optional_candles(
                symbol,
                Self::ranged_request(yf::Range::D1, yf::Interval::I1m, true),
            )
            .await?;
        apply_session_prices(&mut snap, &self.calendar, &today);

        let year = self
            .optional_candles(
                symbol,
                Self::ranged_request(yf::Range::Y1, yf::Interval::D1, false),
            )
            .await?;
        apply_year_range(&mut snap, &year);
        Ok(snap)
    }
}

impl KlineConnector for YfConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Yahoo Finance"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }

    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        Some(self as &dyn SnapshotProvider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use yf::core::conversions::f64_to_money_with_currency_str;

    fn candle(ts: DateTime<Utc>, o: f64, h: f64, l: f64, c: f64) -> yf::Candle {
        let m = |v| f64_to_money_with_currency_str(v, Some("USD"));
        yf::Candle {
            ts,
            open: m(o),
            high: m(h),
            low: m(l),
            close: m(c),
            close_unadj: None,
            volume: None,
        }
    }

    // 2024-01-02 New York time, EST (UTC-5).
    fn et(h: i64, m: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
            + chrono::Duration::hours(h)
            + chrono::Duration::minutes(m)
    }

    #[test]
    fn session_prices_come_from_matching_candles() {
        let candles = vec![
            candle(et(4, 1), 99.1, 99.3, 99.0, 99.2),
            candle(et(9, 29), 99.25, 99.75, 99.25, 99.5),
            candle(et(9, 30), 100.0, 100.5, 99.5, 100.2),
            candle(et(12, 0), 100.4, 102.0, 100.1, 101.0),
            candle(et(15, 59), 101.0, 101.2, 98.5, 101.5),
            candle(et(16, 0), 101.6, 101.9, 101.4, 101.7),
            candle(et(19, 59), 101.7, 101.8, 101.6, 101.75),
        ];
        let mut snap = Snapshot::new();
        apply_session_prices(&mut snap, &TradingCalendar::us_equities(), &candles);

        assert_eq!(snap.get(SnapshotField::Open), Some(100.0));
        assert_eq!(snap.get(SnapshotField::DayHigh), Some(102.0));
        assert_eq!(snap.get(SnapshotField::DayLow), Some(98.5));
        assert_eq!(snap.get(SnapshotField::PreMarketPrice), Some(99.5));
        assert_eq!(snap.get(SnapshotField::PostMarketPrice), Some(101.75));
    }

    #[test]
    fn regular_session_only_leaves_extended_prices_absent() {
        let candles = vec![candle(et(10, 0), 10.0, 11.0, 9.0, 10.5)];
        let mut snap = Snapshot::new();
        apply_session_prices(&mut snap, &TradingCalendar::us_equities(), &candles);
        assert_eq!(snap.get(SnapshotField::Open), Some(10.0));
        assert_eq!(snap.get(SnapshotField::PreMarketPrice), None);
        assert_eq!(snap.get(SnapshotField::PostMarketPrice), None);
    }

    #[test]
    fn year_range_spans_all_daily_candles() {
        let candles = vec![
            candle(et(9, 30), 50.0, 60.0, 45.0, 55.0),
            candle(et(9, 30) + chrono::Duration::days(1), 55.0, 150.0, 52.0, 140.0),
            candle(et(9, 30) + chrono::Duration::days(2), 140.0, 141.0, 40.0, 41.0),
        ];
        let mut snap = Snapshot::new();
        apply_year_range(&mut snap, &candles);
        assert_eq!(snap.get(SnapshotField::FiftyTwoWeekHigh), Some(150.0));
        assert_eq!(snap.get(SnapshotField::FiftyTwoWeekLow), Some(40.0));

        let mut empty = Snapshot::new();
        apply_year_range(&mut empty, &[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn series_request_maps_window_and_interval() {
        let start = et(4, 0);
        let end = et(20, 0);
        let req = YfConnector::history_request(&SeriesRequest::intraday(start, end));
        assert_eq!(req.interval, yf::Interval::I1m);
        assert_eq!(req.period, Some((start.timestamp(), end.timestamp())));
        assert!(req.range.is_none());
        assert!(req.include_prepost);
        assert!(!req.keepna);

        let req = YfConnector::history_request(&SeriesRequest::full_daily_history());
        assert_eq!(req.interval, yf::Interval::D1);
        assert_eq!(req.range, Some(yf::Range::Max));
        assert!(req.period.is_none());
    }
}
