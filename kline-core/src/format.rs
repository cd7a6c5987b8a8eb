//! Fixed-column text rendering.
//!
//! A long-form K-line row looks like
//!
//! ```text
//! 06:30/09:30e:      99.00L | [    100.00 ↑     100.50] (+0.50%) |     101.00H
//! ```
//!
//! Every function here is total: unusable values render as `N/A` and
//! unguardable percentages render as `+0.00%`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::numeric::{format_or_placeholder, format_price, pct_change};
use crate::types::{OhlcRecord, Snapshot, SnapshotField, Verbosity};

const UP: char = '↑';
const DOWN: char = '↓';

/// One timestamp rendering: timezone, `strftime` pattern, and a literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLabel {
    /// Zone the timestamp is converted to.
    pub tz: Tz,
    /// `chrono` format pattern.
    pub pattern: &'static str,
    /// Appended verbatim after the formatted time.
    pub suffix: &'static str,
}

impl TimeLabel {
    /// Build a label.
    #[must_use]
    pub const fn new(tz: Tz, pattern: &'static str, suffix: &'static str) -> Self {
        Self {
            tz,
            pattern,
            suffix,
        }
    }

    /// Render `ts` with this label.
    #[must_use]
    pub fn render(&self, ts: DateTime<Utc>) -> String {
        format!("{}{}", ts.with_timezone(&self.tz).format(self.pattern), self.suffix)
    }
}

/// Render `ts` through every label, joined with `/`.
#[must_use]
pub fn render_labels(labels: &[TimeLabel], ts: DateTime<Utc>) -> String {
    labels
        .iter()
        .map(|l| l.render(ts))
        .collect::<Vec<_>>()
        .join("/")
}

/// `+x.xx%` / `-x.xx%`; zero and negative zero print with `+`.
#[must_use]
pub fn signed_pct(pct: f64) -> String {
    let pct = if pct.is_finite() { pct } else { 0.0 };
    let sign = if pct >= 0.0 { '+' } else { '-' };
    format!("{sign}{:.2}%", pct.abs())
}

/// Render one K-line row.
#[must_use]
pub fn format_kline(record: &OhlcRecord, labels: &[TimeLabel], verbosity: Verbosity) -> String {
    let when = render_labels(labels, record.start);
    let dir = if record.is_up() { UP } else { DOWN };
    match verbosity {
        Verbosity::Short => format!(
            "{when}: {} | [{} {dir} {}] | {}",
            compact(Some(record.low)),
            compact(Some(record.open)),
            compact(Some(record.close)),
            compact(Some(record.high)),
        ),
        _ => format!(
            "{when}: {}L | [{} {dir} {}] ({}) | {}H",
            format_price(&record.low),
            format_price(&record.open),
            format_price(&record.close),
            signed_pct(record.pct_change()),
            format_price(&record.high),
        ),
    }
}

fn compact(v: Option<f64>) -> String {
    format_or_placeholder(&v, 0, 2)
}

/// Row formatter bound to a set of time labels and a verbosity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormatter {
    labels: Vec<TimeLabel>,
    verbosity: Verbosity,
}

impl LineFormatter {
    /// Formatter with explicit labels.
    #[must_use]
    pub const fn new(labels: Vec<TimeLabel>, verbosity: Verbosity) -> Self {
        Self { labels, verbosity }
    }

    /// Intraday rows: `HH:MM` Pacific, then `HH:MMe` Eastern.
    #[must_use]
    pub fn intraday(verbosity: Verbosity) -> Self {
        Self::new(
            vec![
                TimeLabel::new(chrono_tz::America::Los_Angeles, "%H:%M", ""),
                TimeLabel::new(chrono_tz::America::New_York, "%H:%M", "e"),
            ],
            verbosity,
        )
    }

    /// Daily rows: `YYYY-MM-DD` in `tz`.
    #[must_use]
    pub fn daily(tz: Tz, verbosity: Verbosity) -> Self {
        Self::new(vec![TimeLabel::new(tz, "%Y-%m-%d", "")], verbosity)
    }

    /// Verbosity this formatter renders with.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Render one record.
    #[must_use]
    pub fn line(&self, record: &OhlcRecord) -> String {
        format_kline(record, &self.labels, self.verbosity)
    }
}

/// `Current Data as of 2024-01-02 07:15 PT (10:15 ET) (Close Prices Summary):`
#[must_use]
pub fn snapshot_header(now: DateTime<Utc>) -> String {
    let pt = now.with_timezone(&chrono_tz::America::Los_Angeles);
    let et = now.with_timezone(&chrono_tz::America::New_York);
    format!(
        "Current Data as of {} ({}) (Close Prices Summary):",
        pt.format("%Y-%m-%d %H:%M PT"),
        et.format("%H:%M ET")
    )
}

/// Render the snapshot block, one line per field in fixed order.
#[must_use]
pub fn format_snapshot(snapshot: &Snapshot, verbosity: Verbosity) -> Vec<String> {
    let long = verbosity == Verbosity::Long;
    let value = |v: Option<f64>| {
        if long {
            format_price(&v)
        } else {
            compact(v)
        }
    };
    let marked = |v: Option<f64>, marker: &str| {
        if long {
            format!("{}{marker}", value(v))
        } else {
            value(v)
        }
    };
    let with_change = |v: Option<f64>, base: Option<f64>| {
        let text = value(v);
        match pct_change(base, v) {
            Some(p) => format!("{text} ({})", signed_pct(p)),
            None => text,
        }
    };

    let previous_close = snapshot.get(SnapshotField::PreviousClose);
    let open = snapshot.get(SnapshotField::Open);
    let current = snapshot.current_price();
    let from_open = pct_change(open, current).unwrap_or(0.0);

    vec![
        format!("Previous Close: {}", value(previous_close)),
        format!("Open: {}", value(open)),
        format!("High: {}", marked(snapshot.get(SnapshotField::DayHigh), "H")),
        format!("Low: {}", marked(snapshot.get(SnapshotField::DayLow), "L")),
        format!(
            "Current/Regular Market Price: {} ({} from open)",
            value(current),
            signed_pct(from_open)
        ),
        format!("52wk High: {}", value(snapshot.get(SnapshotField::FiftyTwoWeekHigh))),
        format!("52wk Low: {}", value(snapshot.get(SnapshotField::FiftyTwoWeekLow))),
        format!(
            "Pre-Market Price: {}",
            with_change(snapshot.get(SnapshotField::PreMarketPrice), previous_close)
        ),
        format!(
            "After-Market Price: {}",
            with_change(
                snapshot.get(SnapshotField::PostMarketPrice),
                snapshot.get(SnapshotField::RegularMarketPrice)
            )
        ),
    ]
}
