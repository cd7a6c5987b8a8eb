use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::numeric::MaybeNumeric;
use crate::session::local_to_utc;
use crate::types::{KlineError, OhlcRecord, Sample};

/// Where the minute-bucket grid is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOrigin {
    /// The earliest timestamp in the input.
    FirstSample,
    /// A fixed instant, typically a session start.
    At(DateTime<Utc>),
}

#[derive(Default)]
struct BucketAgg {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
}

impl BucketAgg {
    fn push(&mut self, s: &Sample) {
        if self.open.is_none() {
            self.open = s.open.as_finite();
        }
        if let Some(h) = s.high.as_finite() {
            self.high = Some(self.high.map_or(h, |cur| cur.max(h)));
        }
        if let Some(l) = s.low.as_finite() {
            self.low = Some(self.low.map_or(l, |cur| cur.min(l)));
        }
        if let Some(c) = s.close.as_finite() {
            self.close = Some(c);
        }
    }

    fn finish(self, start: DateTime<Utc>) -> Option<OhlcRecord> {
        Some(OhlcRecord {
            start,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
        })
    }
}

/// Group samples by a bucket function and reduce each bucket to one record.
///
/// Samples for which `bucket_of` yields `None` are skipped. Buckets that never
/// saw one of the four prices are dropped rather than filled.
fn resample_by<F>(samples: &[Sample], bucket_of: F) -> Vec<OhlcRecord>
where
    F: Fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
{
    let mut buckets: BTreeMap<DateTime<Utc>, BucketAgg> = BTreeMap::new();
    for s in samples {
        let Some(start) = bucket_of(s.ts) else {
            continue;
        };
        buckets.entry(start).or_default().push(s);
    }
    buckets
        .into_iter()
        .filter_map(|(start, agg)| agg.finish(start))
        .collect()
}

/// Resample into fixed `minutes`-wide buckets aligned to `origin`.
///
/// Bucket `k` covers `[origin + k*width, origin + (k+1)*width)`; samples earlier
/// than an explicit origin land in negative-index buckets on the same grid.
///
/// # Errors
/// Returns `KlineError::InvalidArg` when `minutes` is zero.
///
/// ```
/// use kline_core::{BucketOrigin, Sample, resample_to_minutes};
/// use chrono::{DateTime, Utc};
/// fn t(sec: i64) -> DateTime<Utc> { DateTime::from_timestamp(sec, 0).unwrap() }
/// let rows = vec![
///     Sample::new(t(0), 1.0, 2.0, 0.5, 1.5),
///     Sample::new(t(60), 1.5, 3.0, 1.0, 2.5),
///     Sample::new(t(120), 2.5, 2.6, 2.0, 2.1),
/// ];
/// let out = resample_to_minutes(&rows, 2, BucketOrigin::FirstSample).unwrap();
/// assert_eq!(out.len(), 2);
/// assert_eq!((out[0].open, out[0].high, out[0].low, out[0].close), (1.0, 3.0, 0.5, 2.5));
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(samples), fields(samples = samples.len()))
)]
pub fn resample_to_minutes(
    samples: &[Sample],
    minutes: u32,
    origin: BucketOrigin,
) -> Result<Vec<OhlcRecord>, KlineError> {
    if minutes == 0 {
        return Err(KlineError::InvalidArg("minute step must be positive".into()));
    }
    let origin = match origin {
        BucketOrigin::At(at) => at,
        BucketOrigin::FirstSample => match samples.iter().map(|s| s.ts).min() {
            Some(first) => first,
            None => return Ok(Vec::new()),
        },
    };
    let width = i64::from(minutes) * 60;
    Ok(resample_by(samples, |ts| {
        let offset = (ts - origin).num_seconds();
        let k = offset.div_euclid(width);
        origin.checked_add_signed(Duration::seconds(k * width))
    }))
}

/// Resample into calendar-day buckets of `days` days in timezone `tz`.
///
/// The grid starts at the civil date of the earliest sample; each record's
/// `start` is the local midnight of its bucket's first day.
///
/// # Errors
/// Returns `KlineError::InvalidArg` when `days` is zero.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(samples), fields(samples = samples.len()))
)]
pub fn resample_to_days(
    samples: &[Sample],
    days: u32,
    tz: Tz,
) -> Result<Vec<OhlcRecord>, KlineError> {
    if days == 0 {
        return Err(KlineError::InvalidArg("day step must be positive".into()));
    }
    let Some(first) = samples.iter().map(|s| s.ts).min() else {
        return Ok(Vec::new());
    };
    let origin: NaiveDate = first.with_timezone(&tz).date_naive();
    let width = i64::from(days);
    Ok(resample_by(samples, |ts| {
        let date = ts.with_timezone(&tz).date_naive();
        let k = (date - origin).num_days().div_euclid(width);
        let bucket_date = origin.checked_add_signed(Duration::days(k * width))?;
        Some(local_to_utc(tz, bucket_date.and_hms_opt(0, 0, 0)?))
    }))
}

/// Keep the most recent `max_records` entries.
#[must_use]
pub fn tail<T>(mut records: Vec<T>, max_records: usize) -> Vec<T> {
    let cut = records.len().saturating_sub(max_records);
    records.split_off(cut)
}
