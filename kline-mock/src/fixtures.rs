use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use kline_core::{Sample, Session, Snapshot, SnapshotField, TradingCalendar};

/// Symbols the mock knows, with a base price each.
const SYMBOLS: &[(&str, f64)] = &[("NVDA", 480.0), ("AAPL", 185.0), ("MSFT", 370.0)];

/// Trading days served for a full daily history.
pub const DAILY_HISTORY_LEN: usize = 90;

// One extended trading day is 960 minutes; a week of them is plenty.
const MAX_MINUTES: i64 = 60 * 24 * 7;

pub fn base_price(symbol: &str) -> Option<f64> {
    SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
}

fn cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Bar whose shape depends only on `base` and the bar index.
fn bar(ts: DateTime<Utc>, base: f64, k: i64, scale: f64) -> Sample {
    #[allow(clippy::cast_precision_loss)]
    let (step, drift) = ((k % 60) as f64, (k / 60) as f64);
    let open = cents(base + drift * 0.25 * scale + step * 0.01 * scale);
    let close = if k % 3 == 0 {
        cents(open - 0.03 * scale)
    } else {
        cents(open + 0.02 * scale)
    };
    Sample::new(
        ts,
        open,
        cents(open.max(close) + 0.05 * scale),
        cents(open.min(close) - 0.05 * scale),
        close,
    )
}

/// One-minute bars for every open minute in `[start, end)`.
pub fn minute_bars(
    calendar: &TradingCalendar,
    base: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Sample> {
    let first = start.timestamp().div_euclid(60) * 60;
    let Some(mut ts) = DateTime::from_timestamp(first, 0) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for _ in 0..MAX_MINUTES {
        if ts >= end {
            break;
        }
        // Minute indices count from the pre-market open.
        if calendar.session_at(ts).is_some() {
            let date = calendar.local_date(ts);
            if !is_weekend(date) {
                let (day_open, _) = calendar.session_bounds(date, Session::PreMarket);
                let k = (ts - day_open).num_minutes();
                out.push(bar(ts, base, k, 1.0));
            }
        }
        ts += Duration::minutes(1);
    }
    out
}

/// Daily bars for the `DAILY_HISTORY_LEN` weekdays ending at `last_session`,
/// stamped at the regular open.
pub fn daily_bars(calendar: &TradingCalendar, base: f64, last_session: NaiveDate) -> Vec<Sample> {
    let mut dates = Vec::with_capacity(DAILY_HISTORY_LEN);
    let mut d = last_session;
    while dates.len() < DAILY_HISTORY_LEN {
        if !is_weekend(d) {
            dates.push(d);
        }
        let Some(prev) = d.pred_opt() else { break };
        d = prev;
    }
    dates.reverse();
    dates
        .into_iter()
        .zip(0_i64..)
        .map(|(date, i)| {
            let (ts, _) = calendar.session_bounds(date, Session::Regular);
            bar(ts, base, i * 7, 4.0)
        })
        .collect()
}

pub fn snapshot(symbol: &str) -> Option<Snapshot> {
    let base = base_price(symbol)?;
    let snap = Snapshot::new()
        .with(SnapshotField::PreviousClose, base - 2.0)
        .with(SnapshotField::Open, base)
        .with(SnapshotField::DayHigh, base + 5.0)
        .with(SnapshotField::DayLow, base - 3.0)
        .with(SnapshotField::CurrentPrice, base + 1.5)
        .with(SnapshotField::RegularMarketPrice, base + 1.25)
        .with(SnapshotField::FiftyTwoWeekHigh, cents(base * 1.3))
        .with(SnapshotField::FiftyTwoWeekLow, cents(base * 0.6));
    // MSFT carries no extended-hours quotes.
    if symbol == "MSFT" {
        return Some(snap);
    }
    Some(
        snap.with(SnapshotField::PreMarketPrice, base - 0.5)
            .with(SnapshotField::PostMarketPrice, base + 1.75),
    )
}

fn is_weekend(d: NaiveDate) -> bool {
    matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}
