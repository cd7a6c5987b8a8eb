//! Fetch, segment, resample, format and print.
//!
//! Every line goes to the caller's writer. Provider failures become plain
//! messages in the output; only I/O errors abort a run.

use std::io::Write;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kline_core::timeseries::retain_from;
use kline_core::{
    BucketOrigin, KlineError, LineFormatter, Sample, SeriesRequest, Session, Snapshot, Step,
    format_snapshot, resample_to_days, resample_to_minutes, segment, snapshot_header, tail,
};
use thiserror::Error;

use crate::core::{Reporter, tag_err};

/// What one report invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Ticker symbol.
    pub symbol: String,
    /// Exchange-local trading date for intraday reports; today when absent.
    pub date: Option<NaiveDate>,
    /// Exchange-local time before which intraday samples are ignored.
    pub start_time: Option<NaiveTime>,
}

impl ReportRequest {
    /// Request for `symbol` on the current trading date.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            date: None,
            start_time: None,
        }
    }

    /// Intraday date.
    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Ignore intraday samples before `time`.
    #[must_use]
    pub const fn starting_at(mut self, time: NaiveTime) -> Self {
        self.start_time = Some(time);
        self
    }
}

/// How a run ended. Every variant is a normal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// K-lines and the snapshot were printed.
    Complete,
    /// The provider returned no samples for the window.
    NoData,
    /// At least one section was replaced by an "unavailable" message.
    Degraded,
}

/// Failure that stops a report mid-way.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    /// The pipeline rejected its configuration.
    #[error(transparent)]
    Kline(#[from] KlineError),
}

enum Fetched {
    Rows(Vec<Sample>),
    Empty,
    Unavailable,
}

impl Reporter {
    /// Run the report and write it to `out`.
    ///
    /// # Errors
    /// Returns `ReportError::Io` when `out` fails and `ReportError::Kline`
    /// for an invalid resampling configuration. Provider failures are
    /// reported in the output instead.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kline::report::run",
            skip(self, out),
            fields(symbol = %req.symbol, step = %self.cfg.step, connector = self.connector.name()),
        )
    )]
    pub async fn run<W: Write>(
        &self,
        req: &ReportRequest,
        out: &mut W,
    ) -> Result<ReportOutcome, ReportError> {
        let now = self.clock.now();
        let (lines_ok, ended) = match self.cfg.step {
            Step::Days(days) => self.historical(&req.symbol, days, &mut *out).await?,
            Step::Minutes(minutes) => self.intraday(req, minutes, now, &mut *out).await?,
            other => {
                return Err(KlineError::InvalidArg(format!("unsupported step {other}")).into());
            }
        };
        if let Some(outcome) = ended {
            return Ok(outcome);
        }
        let snapshot_ok = self.print_snapshot(&req.symbol, now, out).await?;
        Ok(if lines_ok && snapshot_ok {
            ReportOutcome::Complete
        } else {
            ReportOutcome::Degraded
        })
    }

    async fn fetch(
        &self,
        symbol: &str,
        req: SeriesRequest,
        out: &mut impl Write,
    ) -> std::io::Result<Fetched> {
        let provider = match self.connector.require_series() {
            Ok(p) => p,
            Err(e) => {
                self.unavailable(&e, &mut *out)?;
                return Ok(Fetched::Unavailable);
            }
        };
        match provider.series(symbol, req).await {
            Ok(rows) if rows.is_empty() => Ok(Fetched::Empty),
            Ok(rows) => Ok(Fetched::Rows(rows)),
            Err(e) if e.is_empty_result() => Ok(Fetched::Empty),
            Err(e) => {
                self.unavailable(&tag_err(self.connector.name(), e), &mut *out)?;
                Ok(Fetched::Unavailable)
            }
        }
    }

    /// Returns whether the K-line section printed, and the outcome when the
    /// run ends here.
    async fn intraday(
        &self,
        req: &ReportRequest,
        minutes: u32,
        now: DateTime<Utc>,
        out: &mut impl Write,
    ) -> Result<(bool, Option<ReportOutcome>), ReportError> {
        let cal = &self.calendar;
        let date = req.date.unwrap_or_else(|| cal.local_date(now));
        let (start, end) = cal.day_bounds(date);
        let mut samples = match self
            .fetch(&req.symbol, SeriesRequest::intraday(start, end), &mut *out)
            .await?
        {
            Fetched::Rows(rows) => rows,
            Fetched::Empty => {
                no_data_on(&req.symbol, date, out)?;
                return Ok((false, Some(ReportOutcome::NoData)));
            }
            Fetched::Unavailable => return Ok((false, None)),
        };
        if let Some(t) = req.start_time {
            retain_from(&mut samples, cal.local_instant(date, t));
        }

        let split = segment(&samples, date, cal);
        if split.is_empty() {
            no_data_on(&req.symbol, date, out)?;
            return Ok((false, Some(ReportOutcome::NoData)));
        }

        let show_extended = self
            .cfg
            .extended_hours
            .resolve(cal.default_show_extended_hours(now));
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "kline::report", samples = split.len(), show_extended, "segmented");

        let fmt = LineFormatter::intraday(self.cfg.verbosity);
        writeln!(out, "\n{} Hourly K-lines for {}", req.symbol, date.format("%Y-%m-%d"))?;
        for session in Session::ALL {
            if session.is_extended() && !show_extended {
                continue;
            }
            let rows = split.get(session);
            if rows.is_empty() {
                continue;
            }
            let records =
                resample_to_minutes(rows, minutes, BucketOrigin::At(split.session_start(session)))?;
            writeln!(out, "\n--- {session} ({minutes}-Minute) ---")?;
            for r in &records {
                writeln!(out, "{}", fmt.line(r))?;
            }
        }
        Ok((true, None))
    }

    async fn historical(
        &self,
        symbol: &str,
        days: u32,
        out: &mut impl Write,
    ) -> Result<(bool, Option<ReportOutcome>), ReportError> {
        let samples = match self
            .fetch(symbol, SeriesRequest::full_daily_history(), &mut *out)
            .await?
        {
            Fetched::Rows(rows) => rows,
            Fetched::Empty => {
                writeln!(out, "No data available.")?;
                return Ok((false, Some(ReportOutcome::NoData)));
            }
            Fetched::Unavailable => return Ok((false, None)),
        };

        let tz = self.calendar.timezone();
        let records = tail(resample_to_days(&samples, days, tz)?, self.cfg.max_records);
        let fmt = LineFormatter::daily(tz, self.cfg.verbosity);
        writeln!(
            out,
            "\n{symbol} K-lines for {days}-day intervals (last {} lines):",
            self.cfg.max_records
        )?;
        for r in &records {
            writeln!(out, "{}", fmt.line(r))?;
        }
        Ok((true, None))
    }

    /// Returns false when the snapshot source was unavailable.
    async fn print_snapshot(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        out: &mut impl Write,
    ) -> std::io::Result<bool> {
        let provider = match self.connector.require_snapshot() {
            Ok(p) => p,
            Err(e) => {
                self.unavailable(&e, &mut *out)?;
                return Ok(false);
            }
        };
        let snapshot = match provider.snapshot(symbol).await {
            Ok(s) => s,
            // Unknown fields render as placeholders.
            Err(e) if e.is_empty_result() => Snapshot::new(),
            Err(e) => {
                self.unavailable(&tag_err(self.connector.name(), e), &mut *out)?;
                return Ok(false);
            }
        };
        writeln!(out, "\n{}", snapshot_header(now))?;
        for line in format_snapshot(&snapshot, self.cfg.verbosity) {
            writeln!(out, "{line}")?;
        }
        Ok(true)
    }

    fn unavailable(&self, e: &KlineError, out: &mut impl Write) -> std::io::Result<()> {
        #[cfg(feature = "tracing")]
        tracing::warn!(target: "kline::report", connector = self.connector.name(), error = %e, "source unavailable");
        writeln!(out, "{} data unavailable: {e}", self.connector.vendor())
    }
}

/// Print why no connector could be built. The run still counts as degraded.
///
/// # Errors
/// Returns `ReportError::Io` when `out` fails.
pub fn source_unavailable(
    e: &KlineError,
    out: &mut impl Write,
) -> Result<ReportOutcome, ReportError> {
    writeln!(out, "{e}")?;
    Ok(ReportOutcome::Degraded)
}

fn no_data_on(symbol: &str, date: NaiveDate, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "No data available for {symbol} on {}.", date.format("%Y-%m-%d"))
}
