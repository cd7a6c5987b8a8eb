#[cfg(feature = "test-adapters")]
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kline_core::KlineError;
use yf::core::HistoryService;
use yfinance_rs as yf;

const CONNECTOR: &str = "kline-yfinance";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// History abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait YfHistory: Send + Sync {
    /// Fetch full history for a symbol using a provider-specific request.
    async fn fetch_full(
        &self,
        symbol: &str,
        req: yf::core::services::HistoryRequest,
    ) -> Result<yf::HistoryResponse, KlineError>;
}

/// Quotes abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait YfQuotes: Send + Sync {
    /// Fetch quotes for a batch of symbols.
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<yf::core::Quote>, KlineError>;
}

/// Real adapter backed by a single `YfClient` instance.
/// `YfClient` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone)]
pub struct RealAdapter {
    client: yf::YfClient,
}

impl RealAdapter {
    /// Build a `YfClient` over a cookie-enabled HTTP client with a browser user agent.
    ///
    /// # Errors
    /// Returns a connector error if the HTTP client or the `YfClient` cannot be built.
    pub fn try_new_default() -> Result<Self, KlineError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| KlineError::connector(CONNECTOR, format!("http client: {e}")))?;
        Self::try_with_reqwest_client(http)
    }

    /// Build a `YfClient` on top of an existing `reqwest::Client`.
    ///
    /// The client should keep a cookie store for Yahoo's crumb flow.
    ///
    /// # Errors
    /// Returns a connector error if the `YfClient` cannot be built.
    pub fn try_with_reqwest_client(http: reqwest::Client) -> Result<Self, KlineError> {
        let client = yf::YfClient::builder()
            .custom_client(http)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| map_yf_err(&e, "client"))?;
        Ok(Self::new(client))
    }

    /// Wrap an existing `YfClient`.
    #[must_use]
    pub const fn new(client: yf::YfClient) -> Self {
        Self { client }
    }
}

fn looks_like_not_found(msg: &str) -> bool {
    let m = msg.to_ascii_lowercase();
    m.contains("not found") || m.contains("no data")
}

pub(crate) fn map_yf_err(e: &yf::YfError, context: &str) -> KlineError {
    match e {
        yf::YfError::NotFound { .. } | yf::YfError::MissingData(_) => {
            KlineError::not_found(context.to_string())
        }
        yf::YfError::Api(msg) if looks_like_not_found(msg) => {
            KlineError::not_found(context.to_string())
        }
        yf::YfError::RateLimited { .. } => {
            KlineError::connector(CONNECTOR, format!("rate limit: {context}"))
        }
        yf::YfError::ServerError { status, .. } => {
            KlineError::connector(CONNECTOR, format!("server error {status}: {context}"))
        }
        yf::YfError::Status { status, .. } => {
            KlineError::connector(CONNECTOR, format!("status {status}: {context}"))
        }
        other => KlineError::connector(CONNECTOR, other.to_string()),
    }
}

#[async_trait]
impl YfHistory for RealAdapter {
    async fn fetch_full(
        &self,
        symbol: &str,
        req: yf::core::services::HistoryRequest,
    ) -> Result<yf::HistoryResponse, KlineError> {
        self.client
            .fetch_full_history(symbol, req)
            .await
            .map_err(|e| map_yf_err(&e, &format!("history for {symbol}")))
    }
}

#[async_trait]
impl YfQuotes for RealAdapter {
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<yf::core::Quote>, KlineError> {
        yf::quote::quotes(&self.client, symbols.iter().cloned())
            .await
            .map_err(|e| map_yf_err(&e, "quotes"))
    }
}

/* -------- Test-only lightweight adapter constructors ------- */

#[cfg(feature = "test-adapters")]
impl dyn YfHistory {
    /// Build a `YfHistory` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn YfHistory>
    where
        F: Send
            + Sync
            + 'static
            + Fn(
                String,
                yf::core::services::HistoryRequest,
            ) -> Result<yf::HistoryResponse, KlineError>,
    {
        struct FnHist<F>(F);
        #[async_trait]
        impl<F> YfHistory for FnHist<F>
        where
            F: Send
                + Sync
                + 'static
                + Fn(
                    String,
                    yf::core::services::HistoryRequest,
                ) -> Result<yf::HistoryResponse, KlineError>,
        {
            async fn fetch_full(
                &self,
                symbol: &str,
                req: yf::core::services::HistoryRequest,
            ) -> Result<yf::HistoryResponse, KlineError> {
                (self.0)(symbol.to_string(), req)
            }
        }
        Arc::new(FnHist(f))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn YfQuotes {
    /// Build a `YfQuotes` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn YfQuotes>
    where
        F: Send + Sync + 'static + Fn(Vec<String>) -> Result<Vec<yf::core::Quote>, KlineError>,
    {
        struct FnQuotes<F>(F);
        #[async_trait]
        impl<F> YfQuotes for FnQuotes<F>
        where
            F: Send + Sync + 'static + Fn(Vec<String>) -> Result<Vec<yf::core::Quote>, KlineError>,
        {
            async fn fetch(&self, symbols: &[String]) -> Result<Vec<yf::core::Quote>, KlineError> {
                (self.0)(symbols.to_vec())
            }
        }
        Arc::new(FnQuotes(f))
    }
}

/// Helper trait to split a concrete adapter into arc trait objects.
#[cfg(feature = "test-adapters")]
pub trait CloneArcAdapters {
    /// Clone as `Arc<dyn YfHistory>`.
    fn clone_arc_history(&self) -> Arc<dyn YfHistory> {
        <dyn YfHistory>::from_fn(|_, _| Err(KlineError::unsupported("series")))
    }
    /// Clone as `Arc<dyn YfQuotes>`.
    fn clone_arc_quotes(&self) -> Arc<dyn YfQuotes> {
        <dyn YfQuotes>::from_fn(|_| Err(KlineError::unsupported("snapshot")))
    }
}

#[cfg(feature = "test-adapters")]
impl CloneArcAdapters for RealAdapter {
    fn clone_arc_history(&self) -> Arc<dyn YfHistory> {
        Arc::new(self.clone()) as Arc<dyn YfHistory>
    }
    fn clone_arc_quotes(&self) -> Arc<dyn YfQuotes> {
        Arc::new(self.clone()) as Arc<dyn YfQuotes>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_symbols_map_to_not_found() {
        let url = "https://query1.finance.yahoo.com/v8/finance/chart/ZZZZ".to_string();
        assert!(map_yf_err(&yf::YfError::NotFound { url }, "history").is_empty_result());
        assert!(map_yf_err(&yf::YfError::MissingData("no candles".into()), "history").is_empty_result());
        assert!(
            map_yf_err(&yf::YfError::Api("No data found, symbol may be delisted".into()), "x")
                .is_empty_result()
        );
    }

    #[test]
    fn transport_failures_stay_connector_errors() {
        let url = "https://query1.finance.yahoo.com".to_string();
        let limited = map_yf_err(&yf::YfError::RateLimited { url: url.clone() }, "quotes");
        assert!(!limited.is_empty_result());
        assert!(limited.to_string().contains("rate limit: quotes"));

        let status = map_yf_err(&yf::YfError::Status { status: 418, url }, "quotes");
        assert!(status.to_string().contains("status 418"));

        let other = map_yf_err(&yf::YfError::Api("invalid crumb".into()), "quotes");
        assert!(!other.is_empty_result());
    }
}
