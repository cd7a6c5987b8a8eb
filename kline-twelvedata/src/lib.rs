//! kline-twelvedata
//!
//! Connector for the Twelve Data REST API: `/time_series` for bars and
//! `/quote` for the snapshot. Twelve Data encodes prices as strings, so every
//! field goes through the numeric guard. Requires an API key.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use kline_core::{
    Interval, KlineError, Sample, SeriesRequest, Snapshot, SnapshotField,
    connector::{ConnectorKey, KlineConnector, SeriesProvider, SnapshotProvider},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

const CONNECTOR: &str = "kline-twelvedata";
// Largest page the API serves in one call.
const MAX_OUTPUT: &str = "5000";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct TimeSeriesBody {
    #[serde(default)]
    values: Vec<Bar>,
}

#[derive(Debug, Deserialize)]
struct Bar {
    datetime: String,
    open: Option<Value>,
    high: Option<Value>,
    low: Option<Value>,
    close: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBody {
    open: Option<Value>,
    high: Option<Value>,
    low: Option<Value>,
    close: Option<Value>,
    previous_close: Option<Value>,
    #[serde(default)]
    fifty_two_week: FiftyTwoWeek,
}

#[derive(Debug, Default, Deserialize)]
struct FiftyTwoWeek {
    low: Option<Value>,
    high: Option<Value>,
}

/// Error envelope; sent with HTTP 200 and `"status": "error"`.
#[derive(Debug, Deserialize)]
struct ApiError {
    status: Option<String>,
    code: Option<u16>,
    message: Option<String>,
}

/// Twelve Data connector.
#[derive(Clone)]
pub struct TwelveDataConnector {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TwelveDataConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("kline-twelvedata");

    /// Production API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.twelvedata.com";

    /// Build against the production API.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KlineError> {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    /// Build against another host, e.g. an HTTP fixture server.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client cannot be constructed.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| KlineError::connector(CONNECTOR, format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, KlineError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| KlineError::InvalidArg(format!("base url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| KlineError::InvalidArg(format!("base url '{}'", self.base_url)))?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<T, KlineError> {
        let resp = self
            .http
            .get(self.endpoint(path)?)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(KlineError::connector(CONNECTOR, format!("status {status}: {text}")));
            }
            Err(e) => {
                return Err(KlineError::Data(format!("unexpected payload for {context}: {e}")));
            }
        };

        if let Ok(err) = serde_json::from_value::<ApiError>(body.clone()) {
            if err.status.as_deref() == Some("error") || !status.is_success() {
                return Err(map_api_error(&err, context));
            }
        }
        serde_json::from_value(body)
            .map_err(|e| KlineError::Data(format!("unexpected payload for {context}: {e}")))
    }
}

fn map_api_error(err: &ApiError, context: &str) -> KlineError {
    let msg = err.message.clone().unwrap_or_default();
    let lower = msg.to_ascii_lowercase();
    if err.code == Some(404) || lower.contains("not found") || lower.contains("no data") {
        return KlineError::not_found(context.to_string());
    }
    match err.code {
        Some(401 | 403) => KlineError::connector(CONNECTOR, format!("access denied: {msg}")),
        Some(429) => KlineError::connector(CONNECTOR, format!("rate limit: {msg}")),
        Some(code) => KlineError::connector(CONNECTOR, format!("code {code}: {msg}")),
        None => KlineError::connector(CONNECTOR, msg),
    }
}

/// Bars are requested in UTC; date-only daily bars are stamped at 12:00 UTC so
/// the exchange-local civil date is the one the API reported.
fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DATETIME_FMT) {
        return Some(dt.and_utc());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

fn bar_to_sample(bar: &Bar) -> Option<Sample> {
    let ts = parse_datetime(&bar.datetime)?;
    let s = Sample::from_raw(ts, &bar.open, &bar.high, &bar.low, &bar.close);
    (!s.is_blank()).then_some(s)
}

#[async_trait]
impl SeriesProvider for TwelveDataConnector {
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        let interval = match req.interval {
            Interval::Minute1 => "1min",
            _ => "1day",
        };
        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("timezone", "UTC".to_string()),
            ("order", "asc".to_string()),
            ("outputsize", MAX_OUTPUT.to_string()),
        ];
        if let Some(start) = req.start {
            params.push(("start_date", start.format(DATETIME_FMT).to_string()));
        }
        if let Some(end) = req.end {
            params.push(("end_date", end.format(DATETIME_FMT).to_string()));
        }
        if req.include_prepost {
            params.push(("prepost", "true".to_string()));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "kline::twelvedata", symbol, interval, "fetching time series");

        let body: TimeSeriesBody = self
            .get("time_series", &params, &format!("time series for {symbol}"))
            .await?;
        let mut rows: Vec<Sample> = body.values.iter().filter_map(bar_to_sample).collect();
        rows.sort_by_key(|s| s.ts);
        Ok(rows)
    }
}

#[async_trait]
impl SnapshotProvider for TwelveDataConnector {
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError> {
        let q: QuoteBody = self
            .get(
                "quote",
                &[("symbol", symbol.to_string())],
                &format!("quote for {symbol}"),
            )
            .await?;
        let mut snap = Snapshot::new();
        snap.set(SnapshotField::PreviousClose, &q.previous_close);
        snap.set(SnapshotField::Open, &q.open);
        snap.set(SnapshotField::DayHigh, &q.high);
        snap.set(SnapshotField::DayLow, &q.low);
        snap.set(SnapshotField::CurrentPrice, &q.close);
        snap.set(SnapshotField::RegularMarketPrice, &q.close);
        snap.set(SnapshotField::FiftyTwoWeekHigh, &q.fifty_two_week.high);
        snap.set(SnapshotField::FiftyTwoWeekLow, &q.fifty_two_week.low);
        if snap.is_empty() {
            return Err(KlineError::not_found(format!("quote for {symbol}")));
        }
        Ok(snap)
    }
}

impl KlineConnector for TwelveDataConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Twelve Data"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }

    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        Some(self as &dyn SnapshotProvider)
    }
}
