#![cfg(feature = "test-adapters")]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use kline_core::connector::SeriesProvider;
use kline_core::{KlineError, SeriesRequest};
use kline_yfinance::{YfConnector, adapter};
use yf::core::conversions::f64_to_money_with_currency_str;
use yfinance_rs as yf;

struct Combo {
    h: Arc<dyn adapter::YfHistory>,
}
impl adapter::CloneArcAdapters for Combo {
    fn clone_arc_history(&self) -> Arc<dyn adapter::YfHistory> {
        self.h.clone()
    }
}

fn candle(ts: i64, o: f64, h: f64, l: f64, c: f64) -> yf::Candle {
    let m = |v| f64_to_money_with_currency_str(v, Some("USD"));
    yf::Candle {
        ts: Utc.timestamp_opt(ts, 0).unwrap(),
        open: m(o),
        high: m(h),
        low: m(l),
        close: m(c),
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
async fn intraday_series_uses_period_and_extended_hours() {
    let hist = <dyn adapter::YfHistory>::from_fn(|symbol, req| {
        assert_eq!(symbol, "AAPL");
        assert_eq!(req.interval, yf::Interval::I1m);
        assert!(req.include_prepost);
        assert_eq!(req.period, Some((1_000, 2_000)));
        assert!(req.range.is_none());
        Ok(response(vec![candle(1_060, 1.0, 2.0, 0.5, 1.5)]))
    });
    let yf = YfConnector::from_adapter(&Combo { h: hist });

    let req = SeriesRequest::intraday(
        DateTime::from_timestamp(1_000, 0).unwrap(),
        DateTime::from_timestamp(2_000, 0).unwrap(),
    );
    let rows = yf.series("AAPL", req).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].high, Some(2.0));
    assert_eq!(rows[0].close, Some(1.5));
}

#[tokio::test]
async fn daily_series_asks_for_max_range_and_sorts() {
    let hist = <dyn adapter::YfHistory>::from_fn(|_symbol, req| {
        assert_eq!(req.range, Some(yf::Range::Max));
        assert_eq!(req.interval, yf::Interval::D1);
        assert!(req.period.is_none());
        Ok(response(vec![
            candle(259_200, 3.0, 3.5, 2.5, 3.2),
            candle(86_400, 1.0, 2.0, 0.5, 1.5),
            candle(172_800, 1.5, 2.5, 1.0, 2.5),
        ]))
    });
    let yf = YfConnector::from_adapter(&Combo { h: hist });

    let rows = yf
        .series("AAPL", SeriesRequest::full_daily_history())
        .await
        .unwrap();
    let ts: Vec<i64> = rows.iter().map(|s| s.ts.timestamp()).collect();
    assert_eq!(ts, vec![86_400, 172_800, 259_200]);
}

#[tokio::test]
async fn series_errors_pass_through() {
    let hist = <dyn adapter::YfHistory>::from_fn(|_, _| Err(KlineError::not_found("history for ZZZZ")));
    let yf = YfConnector::from_adapter(&Combo { h: hist });

    let err = yf
        .series("ZZZZ", SeriesRequest::full_daily_history())
        .await
        .unwrap_err();
    assert!(err.is_empty_result());
}
