//! kline-finnhub
//!
//! Connector for the Finnhub REST API. Series come from `/stock/candle`
//! (resolution `1` or `D`), the snapshot from `/quote`. Finnhub does not
//! separate extended-hours prices, so pre/after-market fields stay absent.
//! Requires an API key.
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
use serde::de::DeserializeOwned;
use url::Url;

const CONNECTOR: &str = "kline-finnhub";

#[derive(Debug, Deserialize)]
struct CandleBody {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<Option<f64>>,
    #[serde(default)]
    h: Vec<Option<f64>>,
    #[serde(default)]
    l: Vec<Option<f64>>,
    #[serde(default)]
    c: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    c: Option<f64>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    pc: Option<f64>,
    #[serde(default)]
    t: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Finnhub connector.
#[derive(Clone)]
pub struct FinnhubConnector {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("kline-finnhub");

    /// Production API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://finnhub.io/api/v1";

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
            .timeout(Duration::from_secs(10))
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
            .extend(path.split('/'));
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
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(KlineError::connector(CONNECTOR, format!("access denied: {context}")));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(KlineError::connector(CONNECTOR, format!("rate limit: {context}")));
        }
        let text = resp
            .text()
            .await
            .map_err(|e| KlineError::connector(CONNECTOR, e.to_string()))?;
        if !status.is_success() {
            let msg = serde_json::from_str::<ErrorBody>(&text).map_or(text, |b| b.error);
            return Err(KlineError::connector(CONNECTOR, format!("status {status}: {msg}")));
        }
        serde_json::from_str(&text)
            .map_err(|e| KlineError::Data(format!("unexpected payload for {context}: {e}")))
    }
}

fn candles_to_samples(body: &CandleBody) -> Vec<Sample> {
    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();
    body.t
        .iter()
        .enumerate()
        .filter_map(|(i, &secs)| {
            let ts = DateTime::from_timestamp(secs, 0)?;
            let s = Sample::from_raw(
                ts,
                at(&body.o, i),
                at(&body.h, i),
                at(&body.l, i),
                at(&body.c, i),
            );
            (!s.is_blank()).then_some(s)
        })
        .collect()
}

#[async_trait]
impl SeriesProvider for FinnhubConnector {
    async fn series(&self, symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        let resolution = match req.interval {
            Interval::Minute1 => "1",
            _ => "D",
        };
        let from = req.start.map_or(0, |t| t.timestamp());
        let to = req.end.unwrap_or_else(Utc::now).timestamp();
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "kline::finnhub", symbol, resolution, from, to, "fetching candles");
        let body: CandleBody = self
            .get(
                "stock/candle",
                &[
                    ("symbol", symbol.to_string()),
                    ("resolution", resolution.to_string()),
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                ],
                &format!("candles for {symbol}"),
            )
            .await?;
        match body.s.as_str() {
            "ok" => Ok(candles_to_samples(&body)),
            "no_data" => Err(KlineError::not_found(format!("candles for {symbol}"))),
            other => Err(KlineError::connector(CONNECTOR, format!("candle status '{other}'"))),
        }
    }
}

#[async_trait]
impl SnapshotProvider for FinnhubConnector {
    async fn snapshot(&self, symbol: &str) -> Result<Snapshot, KlineError> {
        let q: QuoteBody = self
            .get(
                "quote",
                &[("symbol", symbol.to_string())],
                &format!("quote for {symbol}"),
            )
            .await?;
        // Unknown symbols come back as an all-zero quote.
        if q.t == 0 {
            return Err(KlineError::not_found(format!("quote for {symbol}")));
        }
        Ok(Snapshot::new()
            .with(SnapshotField::PreviousClose, q.pc)
            .with(SnapshotField::Open, q.o)
            .with(SnapshotField::DayHigh, q.h)
            .with(SnapshotField::DayLow, q.l)
            .with(SnapshotField::CurrentPrice, q.c)
            .with(SnapshotField::RegularMarketPrice, q.c))
    }
}

impl KlineConnector for FinnhubConnector {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Finnhub"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }

    fn as_snapshot_provider(&self) -> Option<&dyn SnapshotProvider> {
        Some(self as &dyn SnapshotProvider)
    }
}
