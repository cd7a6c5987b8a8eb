use kline::source::{USE_MOCK_ENV, connector_with};
use kline_core::connector::KlineConnector;
use kline_core::{DataSource, KlineError};

fn keys(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |name| {
        pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| (*v).to_string())
    }
}

#[test]
fn every_source_builds_with_credentials() {
    let lookup = keys(&[
        ("FINNHUB_API_KEY", "fh"),
        ("TWELVEDATA_API_KEY", "td"),
        ("MASSIVE_API_KEY", "ms"),
    ]);
    for (source, name) in [
        (DataSource::Yfinance, "kline-yfinance"),
        (DataSource::Finnhub, "kline-finnhub"),
        (DataSource::TwelveData, "kline-twelvedata"),
        (DataSource::Massive, "kline-massive"),
    ] {
        let connector = connector_with(source, &lookup).unwrap();
        assert_eq!(connector.name(), name);
    }
}

#[test]
fn key_gated_source_without_key_reports_env_var() {
    let err = connector_with(DataSource::Finnhub, keys(&[("FINNHUB_API_KEY", "   ")])).err();
    match err {
        Some(KlineError::MissingCredentials { env_var, .. }) => {
            assert_eq!(env_var, "FINNHUB_API_KEY");
        }
        other => panic!("expected missing credentials, got {other:?}"),
    }
}

#[test]
fn mock_switch_overrides_selection() {
    let connector = connector_with(DataSource::Massive, keys(&[(USE_MOCK_ENV, "1")])).unwrap();
    assert_eq!(connector.name(), "kline-mock");
}
