//! Command-line arguments and their validation.

use chrono::{NaiveDate, NaiveTime};
use clap::Parser;
use kline_core::{DataSource, ExtendedHours, ReportConfig, Step, Verbosity};
use thiserror::Error;

use crate::report::ReportRequest;

/// Print K-lines for a ticker, split by trading session, followed by a
/// price snapshot.
#[derive(Debug, Parser)]
#[command(name = "kline", version, about)]
pub struct Args {
    /// Stock ticker symbol.
    #[arg(default_value = "NVDA")]
    pub ticker: String,

    /// Stock ticker symbol; overrides the positional one.
    #[arg(short = 't', long = "ticker", value_name = "TICKER")]
    pub ticker_named: Option<String>,

    /// Bucket width: minutes (`15`, `15m`) for an intraday report or days
    /// (`5d`) for a historical one.
    #[arg(short, long, default_value = "15m")]
    pub step: String,

    /// Trading date for the intraday report, as yyyymmdd. Defaults to today
    /// in New York.
    #[arg(short, long, value_name = "YYYYMMDD")]
    pub date: Option<String>,

    /// Ignore intraday bars before this New York time.
    #[arg(long, value_name = "HH:MM")]
    pub start: Option<String>,

    /// Show pre-market and after-hours sections. Without a value means
    /// true; omitted means hidden only while the regular session is open.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub extended_hours: Option<String>,

    /// Data source: yfinance, massive, finnhub, twelvedata.
    #[arg(long, default_value = "yfinance")]
    pub source: String,

    /// Compact rows without padding, markers or percent change.
    #[arg(long)]
    pub short: bool,

    /// Rows kept by the historical report.
    #[arg(short = 'n', long = "lines", default_value_t = 21)]
    pub lines: usize,
}

/// Input format errors. The binary prints these and exits with status 1.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// `--date` was not yyyymmdd.
    #[error("Invalid DATE format. Use yyyymmdd (e.g., 20231027).")]
    Date(String),
    /// `--start` was not HH:MM.
    #[error("Invalid START format. Use HH:MM (e.g., 09:30).")]
    Time(String),
    /// `--step` was not a positive minute or day count.
    #[error("Invalid STEP '{0}'. Use minutes (15, 15m) or days (5d).")]
    Step(String),
    /// `--extended-hours` was not a boolean.
    #[error("Boolean value expected for --extended-hours, got: {0}")]
    ExtendedHours(String),
    /// `--source` named an unknown backend.
    #[error("Unknown source '{0}'. Options: yfinance, massive, finnhub, twelvedata")]
    Source(String),
    /// `--lines` was zero.
    #[error("--lines must be positive")]
    Lines,
}

/// Validated arguments, ready to build a reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Backend to fetch from.
    pub source: DataSource,
    /// Pipeline configuration.
    pub config: ReportConfig,
    /// Symbol, date and start time.
    pub request: ReportRequest,
}

/// Parse `yyyymmdd`.
///
/// # Errors
/// Returns `CliError::Date` for anything else.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CliError::Date(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| CliError::Date(raw.to_string()))
}

/// Parse `HH:MM`.
///
/// # Errors
/// Returns `CliError::Time` for anything else.
pub fn parse_time(raw: &str) -> Result<NaiveTime, CliError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| CliError::Time(raw.to_string()))
}

impl Args {
    /// Validate every argument.
    ///
    /// # Errors
    /// Returns the first malformed argument as a [`CliError`].
    pub fn validate(&self) -> Result<Invocation, CliError> {
        let step: Step = self
            .step
            .parse()
            .map_err(|_| CliError::Step(self.step.clone()))?;
        let extended_hours = match &self.extended_hours {
            None => ExtendedHours::Auto,
            Some(v) => v
                .parse()
                .map_err(|_| CliError::ExtendedHours(v.clone()))?,
        };
        let source: DataSource = self
            .source
            .parse()
            .map_err(|_| CliError::Source(self.source.clone()))?;
        if self.lines == 0 {
            return Err(CliError::Lines);
        }

        let symbol = self
            .ticker_named
            .as_deref()
            .unwrap_or(&self.ticker)
            .trim()
            .to_ascii_uppercase();
        let mut request = ReportRequest::new(symbol);
        if let Some(d) = &self.date {
            request = request.on(parse_date(d)?);
        }
        if let Some(t) = &self.start {
            request = request.starting_at(parse_time(t)?);
        }

        let config = ReportConfig {
            step,
            verbosity: if self.short {
                Verbosity::Short
            } else {
                Verbosity::Long
            },
            max_records: self.lines,
            extended_hours,
        };
        Ok(Invocation {
            source,
            config,
            request,
        })
    }
}
