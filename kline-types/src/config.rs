//! Configuration types shared across the report pipeline and connectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KlineError;

/// Number of resampled records a historical report keeps by default.
pub const DEFAULT_MAX_RECORDS: usize = 21;

/// Bucket width for resampling, carrying its unit.
///
/// Minute steps select the intraday report (one day, split by session); day
/// steps select the historical report (full history, tail-limited).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Step {
    /// Intraday buckets of `n` minutes.
    Minutes(u32),
    /// Calendar-day buckets of `n` days.
    Days(u32),
}

impl Step {
    /// Numeric width regardless of unit.
    #[must_use]
    pub const fn count(self) -> u32 {
        match self {
            Self::Minutes(n) | Self::Days(n) => n,
        }
    }

    /// True for minute steps.
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        matches!(self, Self::Minutes(_))
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Minutes(15)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(n) => write!(f, "{n}m"),
            Self::Days(n) => write!(f, "{n}d"),
        }
    }
}

impl FromStr for Step {
    type Err = KlineError;

    /// Accepts `15`, `15m`, `15min`, `5d`, `5day`, `5days`. A bare number is minutes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(split);
        let n: u32 = digits
            .parse()
            .map_err(|_| KlineError::InvalidArg(format!("invalid step: {s}")))?;
        if n == 0 {
            return Err(KlineError::InvalidArg(format!("step must be positive: {s}")));
        }
        match unit {
            "" | "m" | "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes(n)),
            "d" | "day" | "days" => Ok(Self::Days(n)),
            _ => Err(KlineError::InvalidArg(format!("invalid step unit: {s}"))),
        }
    }
}

/// Row layout for rendered K-lines and the snapshot block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Verbosity {
    /// Fixed 10-character numeric fields with `L`/`H` markers and percent change.
    #[default]
    Long,
    /// Unpadded two-decimal numbers, no markers, no percent change.
    Short,
}

/// Tri-state control for pre-market and after-hours sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExtendedHours {
    /// Always print extended-hours sections.
    Show,
    /// Never print extended-hours sections.
    Hide,
    /// Decide from the current market phase.
    #[default]
    Auto,
}

impl ExtendedHours {
    /// Resolve against the value the session classifier derived for "now".
    #[must_use]
    pub const fn resolve(self, auto_default: bool) -> bool {
        match self {
            Self::Show => true,
            Self::Hide => false,
            Self::Auto => auto_default,
        }
    }
}

impl FromStr for ExtendedHours {
    type Err = KlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "t" | "y" | "1" | "show" => Ok(Self::Show),
            "no" | "false" | "f" | "n" | "0" | "hide" => Ok(Self::Hide),
            "auto" => Ok(Self::Auto),
            other => Err(KlineError::InvalidArg(format!(
                "boolean value expected, got: {other}"
            ))),
        }
    }
}

/// Market-data backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataSource {
    /// Yahoo Finance chart API; no key needed.
    #[default]
    Yfinance,
    /// Finnhub REST API (`FINNHUB_API_KEY`).
    Finnhub,
    /// Twelve Data REST API (`TWELVEDATA_API_KEY`).
    TwelveData,
    /// Massive aggregates API (`MASSIVE_API_KEY`).
    Massive,
}

impl DataSource {
    /// All selectable sources, in help-text order.
    pub const ALL: [Self; 4] = [Self::Yfinance, Self::Massive, Self::Finnhub, Self::TwelveData];

    /// Name used on the command line and in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yfinance => "yfinance",
            Self::Finnhub => "finnhub",
            Self::TwelveData => "twelvedata",
            Self::Massive => "massive",
        }
    }

    /// Environment variable carrying the API key, if the source is key-gated.
    #[must_use]
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Yfinance => None,
            Self::Finnhub => Some("FINNHUB_API_KEY"),
            Self::TwelveData => Some("TWELVEDATA_API_KEY"),
            Self::Massive => Some("MASSIVE_API_KEY"),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = KlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|src| src.as_str() == wanted)
            .ok_or_else(|| KlineError::InvalidArg(format!("unknown source: {s}")))
    }
}

/// Configuration for one report run.
///
/// A single configurable pipeline covers both the intraday and historical
/// layouts; nothing branches on which backend produced the data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Bucket width and unit.
    pub step: Step,
    /// Row layout.
    pub verbosity: Verbosity,
    /// Historical reports keep only the most recent `max_records` rows.
    pub max_records: usize,
    /// Extended-hours display policy for intraday reports.
    pub extended_hours: ExtendedHours,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            step: Step::default(),
            verbosity: Verbosity::Long,
            max_records: DEFAULT_MAX_RECORDS,
            extended_hours: ExtendedHours::Auto,
        }
    }
}
