//! Backend selection at startup.

use std::sync::Arc;

use kline_core::{DataSource, KlineConnector, KlineError};
use kline_finnhub::FinnhubConnector;
use kline_massive::MassiveConnector;
use kline_mock::MockConnector;
use kline_twelvedata::TwelveDataConnector;
use kline_yfinance::YfConnector;

/// Environment variable that swaps every source for the offline mock.
pub const USE_MOCK_ENV: &str = "KLINE_USE_MOCK";

/// Build the connector for `source`, reading credentials through `lookup`.
///
/// # Errors
/// Returns `MissingCredentials` when a key-gated source has no key, and
/// `Unsupported` for a source this build does not know, and a connector
/// error when the HTTP client cannot be built.
pub fn connector_with(
    source: DataSource,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn KlineConnector>, KlineError> {
    if lookup(USE_MOCK_ENV).is_some_and(|v| !v.is_empty() && v != "0") {
        return Ok(Arc::new(MockConnector::new()));
    }
    let key = || {
        let env = source.api_key_env().unwrap_or_default();
        lookup(env)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| KlineError::missing_credentials(source.as_str(), env))
    };
    let connector: Arc<dyn KlineConnector> = match source {
        DataSource::Yfinance => Arc::new(YfConnector::try_new_default()?),
        DataSource::Finnhub => Arc::new(FinnhubConnector::new(key()?)?),
        DataSource::TwelveData => Arc::new(TwelveDataConnector::new(key()?)?),
        DataSource::Massive => Arc::new(MassiveConnector::new(key()?)?),
        other => return Err(KlineError::unsupported(format!("source {other}"))),
    };
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "kline::source", %source, connector = connector.name(), "selected connector");
    Ok(connector)
}

/// [`connector_with`] over the process environment.
///
/// # Errors
/// See [`connector_with`].
pub fn connector_from_env(source: DataSource) -> Result<Arc<dyn KlineConnector>, KlineError> {
    connector_with(source, |name| std::env::var(name).ok())
}
