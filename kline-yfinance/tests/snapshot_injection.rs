#![cfg(feature = "test-adapters")]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use kline_core::connector::SnapshotProvider;
use kline_core::{KlineError, SnapshotField};
use kline_yfinance::{YfConnector, adapter};
use yf::core::conversions::f64_to_money_with_currency_str;
use yfinance_rs as yf;

struct Combo {
    h: Arc<dyn adapter::YfHistory>,
    q: Arc<dyn adapter::YfQuotes>,
}
impl adapter::CloneArcAdapters for Combo {
    fn clone_arc_history(&self) -> Arc<dyn adapter::YfHistory> {
        self.h.clone()
    }
    fn clone_arc_quotes(&self) -> Arc<dyn adapter::YfQuotes> {
        self.q.clone()
    }
}

fn usd(v: f64) -> paft::money::Money {
    f64_to_money_with_currency_str(v, Some("USD"))
}

fn quote(price: f64, previous_close: f64) -> yf::core::Quote {
    yf::core::Quote {
        symbol: "AAPL".parse::<paft::domain::Symbol>().unwrap(),
        shortname: None,
        price: Some(usd(price)),
        previous_close: Some(usd(previous_close)),
        day_volume: None,
        exchange: None,
        market_state: None,
    }
}

// 2024-01-02 is EST, so New York is UTC-5.
fn candle(hour: u32, minute: u32, o: f64, h: f64, l: f64, c: f64) -> yf::Candle {
    yf::Candle {
        ts: Utc.with_ymd_and_hms(2024, 1, 2, hour, minute, 0).unwrap(),
        open: usd(o),
        high: usd(h),
        low: usd(l),
        close: usd(c),
        close_unadj: None,
        volume: None,
    }
}

fn response(candles: Vec<yf::Candle>) -> yf::HistoryResponse {
    yf::HistoryResponse {
        candles,
        actions: vec![],
        adjusted: true,
        meta: None,
    }
}

#[tokio::test]
async fn snapshot_combines_quote_session_and_year_range() {
    let q = <dyn adapter::YfQuotes>::from_fn(|symbols| {
        assert_eq!(symbols, vec!["AAPL".to_string()]);
        Ok(vec![quote(101.5, 99.0)])
    });
    let h = <dyn adapter::YfHistory>::from_fn(|_symbol, req| {
        if req.interval == yf::Interval::I1m {
            assert_eq!(req.range, Some(yf::Range::D1));
            assert!(req.include_prepost);
            Ok(response(vec![
                candle(9, 0, 99.0, 99.5, 99.0, 99.25),
                candle(14, 30, 100.0, 100.8, 99.8, 100.5),
                candle(18, 0, 100.5, 102.0, 98.75, 101.0),
                candle(21, 0, 101.0, 101.5, 101.0, 101.25),
            ]))
        } else {
            assert_eq!(req.range, Some(yf::Range::Y1));
            assert_eq!(req.interval, yf::Interval::D1);
            Ok(response(vec![
                candle(14, 30, 90.0, 150.0, 85.0, 140.0),
                candle(15, 30, 140.0, 141.0, 60.0, 70.0),
            ]))
        }
    });
    let yf = YfConnector::from_adapter(&Combo { h, q });

    let snap = yf.snapshot("AAPL").await.unwrap();
    assert_eq!(snap.get(SnapshotField::CurrentPrice), Some(101.5));
    assert_eq!(snap.get(SnapshotField::RegularMarketPrice), Some(101.5));
    assert_eq!(snap.get(SnapshotField::PreviousClose), Some(99.0));
    assert_eq!(snap.get(SnapshotField::Open), Some(100.0));
    assert_eq!(snap.get(SnapshotField::DayHigh), Some(102.0));
    assert_eq!(snap.get(SnapshotField::DayLow), Some(98.75));
    assert_eq!(snap.get(SnapshotField::PreMarketPrice), Some(99.25));
    assert_eq!(snap.get(SnapshotField::PostMarketPrice), Some(101.25));
    assert_eq!(snap.get(SnapshotField::FiftyTwoWeekHigh), Some(150.0));
    assert_eq!(snap.get(SnapshotField::FiftyTwoWeekLow), Some(60.0));
}

#[tokio::test]
async fn snapshot_tolerates_missing_history() {
    let q = <dyn adapter::YfQuotes>::from_fn(|_| Ok(vec![quote(10.0, 9.5)]));
    let h = <dyn adapter::YfHistory>::from_fn(|symbol, _| {
        Err(KlineError::not_found(format!("history for {symbol}")))
    });
    let yf = YfConnector::from_adapter(&Combo { h, q });

    let snap = yf.snapshot("AAPL").await.unwrap();
    assert_eq!(snap.current_price(), Some(10.0));
    assert_eq!(snap.get(SnapshotField::Open), None);
    assert_eq!(snap.get(SnapshotField::FiftyTwoWeekHigh), None);
}

#[tokio::test]
async fn snapshot_propagates_history_failures() {
    let q = <dyn adapter::YfQuotes>::from_fn(|_| Ok(vec![quote(10.0, 9.5)]));
    let h = <dyn adapter::YfHistory>::from_fn(|_, _| {
        Err(KlineError::connector("kline-yfinance", "status 500: history"))
    });
    let yf = YfConnector::from_adapter(&Combo { h, q });

    let err = yf.snapshot("AAPL").await.unwrap_err();
    assert!(!err.is_empty_result());
}

#[tokio::test]
async fn empty_quote_list_is_not_found() {
    let q = <dyn adapter::YfQuotes>::from_fn(|_| Ok(vec![]));
    let h = <dyn adapter::YfHistory>::from_fn(|_, _| Ok(response(vec![])));
    let yf = YfConnector::from_adapter(&Combo { h, q });

    let err = yf.snapshot("ZZZZ").await.unwrap_err();
    assert!(err.is_empty_result());
}

#[tokio::test]
async fn quote_not_found_passes_through() {
    let q = <dyn adapter::YfQuotes>::from_fn(|_| Err(KlineError::not_found("quotes")));
    let yf = YfConnector::from_adapter(&Combo {
        h: <dyn adapter::YfHistory>::from_fn(|_, _| Ok(response(vec![]))),
        q,
    });

    let err = yf.snapshot("ZZZZ").await.unwrap_err();
    assert!(err.is_empty_result());
}
