use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use kline::{
    ExtendedHours, FixedClock, KlineConnector, KlineError, ReportOutcome, ReportRequest, Reporter,
    Step, Verbosity,
};
use kline_core::connector::SeriesProvider;
use kline_core::{Sample, SeriesRequest};
use kline_mock::MockConnector;

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
}

// 10:00 New York time on a Friday in January.
fn mid_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 5, 15, 0, 0).unwrap()
}

fn reporter(step: Step, policy: ExtendedHours, now: DateTime<Utc>) -> Reporter {
    Reporter::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .step(step)
        .extended_hours(policy)
        .clock(Arc::new(FixedClock(now)))
        .build()
        .unwrap()
}

async fn render(r: &Reporter, req: &ReportRequest) -> (ReportOutcome, String) {
    let mut out = Vec::new();
    let outcome = r.run(req, &mut out).await.unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

fn kline_rows(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.contains(" | [")).collect()
}

#[tokio::test]
async fn intraday_during_regular_hours_hides_extended_sessions() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Auto, mid_session());
    let (outcome, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;

    assert_eq!(outcome, ReportOutcome::Complete);
    assert!(text.starts_with("\nNVDA Hourly K-lines for 2024-01-05\n"), "{text}");
    assert!(text.contains("\n--- Regular Market (15-Minute) ---\n"));
    assert!(!text.contains("--- Pre-Market"));
    assert!(!text.contains("--- After-Hours"));
    assert_eq!(kline_rows(&text).len(), 26);
    assert!(text.contains(
        "06:30/09:30e:     481.47L | [    481.55 ↑     481.71] (+0.03%) |     481.76H"
    ));
}

#[tokio::test]
async fn snapshot_block_follows_klines() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Auto, mid_session());
    let (_, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;

    let snapshot = text
        .split("\nCurrent Data as of 2024-01-05 07:00 PT (10:00 ET) (Close Prices Summary):\n")
        .nth(1)
        .expect("snapshot header");
    let lines: Vec<&str> = snapshot.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Previous Close:     478.00",
            "Open:     480.00",
            "High:     485.00H",
            "Low:     477.00L",
            "Current/Regular Market Price:     481.50 (+0.31% from open)",
            "52wk High:     624.00",
            "52wk Low:     288.00",
            "Pre-Market Price:     479.50 (+0.31%)",
            "After-Market Price:     481.75 (+0.10%)",
        ]
    );
}

#[tokio::test]
async fn extended_sessions_shown_when_requested() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Show, mid_session());
    let (_, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;

    let pre = text.find("--- Pre-Market (15-Minute) ---").unwrap();
    let regular = text.find("--- Regular Market (15-Minute) ---").unwrap();
    let after = text.find("--- After-Hours (15-Minute) ---").unwrap();
    assert!(pre < regular && regular < after);
    assert_eq!(kline_rows(&text).len(), 22 + 26 + 16);
    assert!(kline_rows(&text)[0].starts_with("01:00/04:00e:"));
}

#[tokio::test]
async fn auto_policy_outside_regular_hours_shows_extended() {
    let evening = Utc.with_ymd_and_hms(2024, 1, 5, 22, 0, 0).unwrap();
    let saturday = Utc.with_ymd_and_hms(2024, 1, 6, 15, 0, 0).unwrap();
    for now in [evening, saturday] {
        let r = reporter(Step::Minutes(60), ExtendedHours::Auto, now);
        let (_, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;
        assert!(text.contains("--- Pre-Market (60-Minute) ---"), "{now}");
        assert!(text.contains("--- After-Hours (60-Minute) ---"), "{now}");
    }
}

#[tokio::test]
async fn hide_policy_wins_over_the_clock() {
    let evening = Utc.with_ymd_and_hms(2024, 1, 5, 22, 0, 0).unwrap();
    let r = reporter(Step::Minutes(30), ExtendedHours::Hide, evening);
    let (_, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;
    assert!(!text.contains("--- Pre-Market"));
    assert_eq!(kline_rows(&text).len(), 13);
}

#[tokio::test]
async fn start_time_drops_earlier_samples() {
    let r = reporter(Step::Minutes(30), ExtendedHours::Show, mid_session());
    let req = ReportRequest::new("NVDA")
        .on(friday())
        .starting_at(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    let (_, text) = render(&r, &req).await;

    assert!(!text.contains("--- Pre-Market"));
    let rows = kline_rows(&text);
    assert!(rows[0].starts_with("07:00/10:00e:"), "{}", rows[0]);
    assert_eq!(rows.len(), 12 + 8);
}

#[tokio::test]
async fn default_date_is_today_in_new_york() {
    // 00:30 UTC on Saturday is still Friday evening in New York.
    let now = Utc.with_ymd_and_hms(2024, 1, 6, 0, 30, 0).unwrap();
    let r = reporter(Step::Minutes(60), ExtendedHours::Hide, now);
    let (_, text) = render(&r, &ReportRequest::new("AAPL")).await;
    assert!(text.starts_with("\nAAPL Hourly K-lines for 2024-01-05\n"), "{text}");
}

#[tokio::test]
async fn short_rows_drop_padding_and_percent() {
    let r = Reporter::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .verbosity(Verbosity::Short)
        .extended_hours(ExtendedHours::Hide)
        .clock(Arc::new(FixedClock(mid_session())))
        .build()
        .unwrap();
    let (_, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;
    assert!(text.contains("\n06:30/09:30e: 481.47 | [481.55 ↑ 481.71] | 481.76\n"));
    assert!(text.contains("\nHigh: 485.00\n"));
}

#[tokio::test]
async fn historical_report_keeps_last_rows() {
    let r = reporter(Step::Days(5), ExtendedHours::Auto, mid_session());
    let (outcome, text) = render(&r, &ReportRequest::new("MSFT")).await;

    assert_eq!(outcome, ReportOutcome::Complete);
    assert!(text.starts_with("\nMSFT K-lines for 5-day intervals (last 21 lines):\n"));
    let rows = kline_rows(&text);
    assert_eq!(rows.len(), 21);
    assert!(rows.iter().all(|l| l.len() > 10 && l.as_bytes()[4] == b'-'));
    assert!(text.contains("After-Market Price:        N/A"));
}

#[tokio::test]
async fn max_records_limits_historical_rows() {
    let r = Reporter::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .step(Step::Days(1))
        .max_records(5)
        .clock(Arc::new(FixedClock(mid_session())))
        .build()
        .unwrap();
    let (_, text) = render(&r, &ReportRequest::new("NVDA")).await;
    let rows = kline_rows(&text);
    assert_eq!(rows.len(), 5);
    assert!(rows[4].starts_with("2024-01-05: "), "{}", rows[4]);
}

#[tokio::test]
async fn empty_fetch_stops_with_a_message() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Auto, mid_session());
    let (outcome, text) = render(&r, &ReportRequest::new("EMPTY").on(friday())).await;
    assert_eq!(outcome, ReportOutcome::NoData);
    assert_eq!(text, "No data available for EMPTY on 2024-01-05.\n");

    let (_, text) = render(&r, &ReportRequest::new("ZZZZ").on(friday())).await;
    assert_eq!(text, "No data available for ZZZZ on 2024-01-05.\n");

    let r = reporter(Step::Days(3), ExtendedHours::Auto, mid_session());
    let (outcome, text) = render(&r, &ReportRequest::new("EMPTY")).await;
    assert_eq!(outcome, ReportOutcome::NoData);
    assert_eq!(text, "No data available.\n");
}

#[tokio::test]
async fn weekend_date_has_no_data() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Auto, mid_session());
    let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
    let (outcome, text) = render(&r, &ReportRequest::new("NVDA").on(sunday)).await;
    assert_eq!(outcome, ReportOutcome::NoData);
    assert_eq!(text, "No data available for NVDA on 2024-01-07.\n");
}

#[tokio::test]
async fn connector_failure_is_reported_and_run_continues() {
    let r = reporter(Step::Minutes(15), ExtendedHours::Auto, mid_session());
    let (outcome, text) = render(&r, &ReportRequest::new("FAIL").on(friday())).await;
    assert_eq!(outcome, ReportOutcome::Degraded);
    assert_eq!(
        text,
        "Mock data unavailable: kline-mock failed: forced failure: series\n\
         Mock data unavailable: kline-mock failed: forced failure: snapshot\n"
    );
}

struct SeriesOnly;

#[async_trait]
impl SeriesProvider for SeriesOnly {
    async fn series(&self, _symbol: &str, req: SeriesRequest) -> Result<Vec<Sample>, KlineError> {
        let start = req.start.unwrap();
        // 09:30 and 09:31 New York time on the requested day.
        let open = start + chrono::Duration::minutes(570);
        Ok(vec![
            Sample::new(open, 100.0, 100.5, 99.5, 100.2),
            Sample::new(open + chrono::Duration::minutes(1), 100.2, 101.0, 99.0, 100.5),
        ])
    }
}

impl KlineConnector for SeriesOnly {
    fn name(&self) -> &'static str {
        "series-only"
    }

    fn vendor(&self) -> &'static str {
        "Test"
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }
}

#[tokio::test]
async fn missing_snapshot_capability_keeps_klines() {
    let r = Reporter::builder()
        .with_connector(Arc::new(SeriesOnly))
        .step(Step::Minutes(15))
        .clock(Arc::new(FixedClock(mid_session())))
        .build()
        .unwrap();
    let (outcome, text) = render(&r, &ReportRequest::new("NVDA").on(friday())).await;

    assert_eq!(outcome, ReportOutcome::Degraded);
    assert!(text.contains(
        "06:30/09:30e:      99.00L | [    100.00 ↑     100.50] (+0.50%) |     101.00H\n"
    ));
    assert!(text.ends_with("Test data unavailable: unsupported capability: snapshot\n"));
}

#[test]
fn builder_requires_a_connector() {
    let err = Reporter::builder().build().err().unwrap();
    assert!(matches!(err, KlineError::InvalidArg(_)));

    let err = Reporter::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .max_records(0)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, KlineError::InvalidArg(_)));
}

struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn unavailable_source_is_printed_as_degraded() {
    let e = KlineError::missing_credentials("finnhub", "FINNHUB_API_KEY");
    let mut out = Vec::new();
    let outcome = kline::report::source_unavailable(&e, &mut out).unwrap();
    assert_eq!(outcome, ReportOutcome::Degraded);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "source 'finnhub' is not available: set FINNHUB_API_KEY\n"
    );
}

#[test]
fn unavailable_source_surfaces_write_failure() {
    let e = KlineError::missing_credentials("finnhub", "FINNHUB_API_KEY");
    let err = kline::report::source_unavailable(&e, &mut BrokenPipe).unwrap_err();
    assert!(matches!(err, kline::ReportError::Io(_)));
}
