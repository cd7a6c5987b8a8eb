//! kline-massive
//!
//! Connector for the Massive aggregates API. Bars come from
//! `/v2/aggs/ticker/{ticker}/range/1/{minute|day}/{from}/{to}` with
//! millisecond bounds. The snapshot is built from the previous-session
//! aggregate, so it carries end-of-day prices and no extended-hours quotes.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kline_core::{
    Interval, KlineError, Sample, SeriesRequest, Snapshot, SnapshotField,
    connector::{ConnectorKey, KlineConnector, SeriesProvider, SnapshotProvider},
};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

const CONNECTOR: &str = "kline-massive";
const MAX_LIMIT: &str = "50000";

#[derive(Debug, Deserialize)]
struct AggsBody {
    status: Option<String>,
    #[serde(default)]
    results: Option<Vec<Agg>>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Agg {
    /// Bar start, Unix milliseconds.
    t: i64,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
}

impl AggsBody {
    fn failure(&self) -> Option<String> {
        match self.status.as_deref() {
            Some("ERROR" | "NOT_AUTHORIZED") => Some(
                self.error
                    .clone()
                    .or_else(|| self.message.clone())
                    .unwrap_or_else(|| "request rejected".to_string()),
            ),
            _ => None,
        }
    }
}

/// Massive connector.
#[derive(Clone)]
pub struct MassiveConnector {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MassiveConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("kline-massive");

    /// Production API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.massive.com";

    /// Build against the production API.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KlineError> {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    /// Build against another host.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client cannot be constructed.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| KlineError::connector(CONNECTOR, format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, KlineError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| KlineError::InvalidArg(format!("base url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| KlineError::InvalidArg(format!("base url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn aggs(&self, url: Url, context: &str) -> Result<Vec<Agg>, KlineError> {
        let resp = self
            .http
            .get(url)
            .query(&[
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", MAX_LIMIT),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(KlineError::connector(CONNECTOR, format!("rate limit: {context}")));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;
        let body: Option<AggsBody> = serde_json::from_str(&text).ok();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let msg = body.and_then(|b| b.failure()).unwrap_or(text);
            return Err(KlineError::connector(CONNECTOR, format!("access denied: {msg}")));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(KlineError::not_found(context.to_string()));
        }
        let Some(body) = body else {
            if status.is_success() {
                return Err(KlineError::Data(format!("unexpected payload for {context}")));
            }
            return Err(KlineError::connector(CONNECTOR, format!("status {status}: {text}")));
        };
        if let Some(msg) = body.failure() {
            return Err(KlineError::connector(CONNECTOR, msg));
        }
        if !status.is_success() {
            return Err(KlineError::connector(CONNECTOR, format!("status {status}")));
        }
        match body.results {
            Some(rows) if !rows.is_empty() => Ok(rows),
            _ => Err(KlineError::not_found(context.to_string())),
        }
    }
}

fn agg_to_sample(a: &Agg) -> Option<Sample> {
    let ts = DateTime::from_timestamp_millis(a.t)?;
    let s = Sample::from_raw(ts, a.o, a.h, a.l, a.c);
    (!s.is_blank()).then_some(s)
}

#[async_trait]
impl SeriesProvider for MassiveConnector {
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        let timespan = match req.interval {
            Interval::Minute1 => "minute",
            _ => "day",
        };
        let from = req.start.map_or(0, |t| t.timestamp_millis());
        let to = req.end.unwrap_or_else(Utc::now).timestamp_millis();
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "kline::massive", symbol, timespan, from, to, "fetching aggregates");

        let url = self.endpoint(&[
            "v2",
            "aggs",
            "ticker",
            symbol,
            "range",
            "1",
            timespan,
            &from.to_string(),
            &to.to_string(),
        ])?;
        let rows = self.aggs(url, &format!("aggregates for {symbol}")).await?;
        Ok(rows.iter().filter_map(agg_to_sample).collect())
    }
}

#[async_trait]
impl SnapshotProvider for MassiveConnector {
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError> {
        let url = self.endpoint(&["v2", "aggs", "ticker", symbol, "prev"])?;
        let rows = self
            .aggs(url, &format!("previous close for {symbol}"))
            .await?;
        let Some(prev) = rows.last() else {
            return Err(KlineError::not_found(format!("previous close for {symbol}")));
        };
        Ok(Snapshot::new()
            .with(SnapshotField::Open, prev.o)
            .with(SnapshotField::DayHigh, prev.h)
            .with(SnapshotField::DayLow, prev.l)
            .with(SnapshotField::PreviousClose, prev.c)
            .with(SnapshotField::RegularMarketPrice, prev.c))
    }
}

impl KlineConnector for MassiveConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Massive"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }

    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        Some(self as &dyn SnapshotProvider)
    }
}
