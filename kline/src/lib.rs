//! kline prints candlestick ("K-line") reports for a stock ticker.
//!
//! Overview
//! - Fetches one-minute bars for a trading day, or the full daily history,
//!   from one connector implementing the `kline_core` contracts.
//! - Intraday reports split the day into pre-market, regular and after-hours
//!   sessions and resample each into fixed-width minute buckets anchored at
//!   the session start.
//! - Historical reports resample daily bars into `n`-day buckets and keep the
//!   most recent rows.
//! - Both end with a snapshot block of previous close, day range, current
//!   price, 52-week range and extended-hours prices.
//!
//! Missing or non-numeric provider values never reach arithmetic; they print
//! as `N/A`. Provider failures print a message naming the source instead of
//! aborting.
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use kline::{ReportRequest, Reporter, Step};
//! use kline_mock::MockConnector;
//!
//! let reporter = Reporter::builder()
//!     .with_connector(Arc::new(MockConnector::new()))
//!     .step(Step::Minutes(30))
//!     .build()?;
//! let mut out = Vec::new();
//! reporter
//!     .run(&ReportRequest::new("NVDA").on(date), &mut out)
//!     .await?;
//! ```
#![warn(missing_docs)]

/// Command-line arguments and validation.
pub mod cli;
/// Injectable source of the current instant.
pub mod clock;
mod core;
/// The report driver.
pub mod report;
/// Connector selection from a [`DataSource`] and the environment.
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use core::{Reporter, ReporterBuilder};
pub use report::{ReportError, ReportOutcome, ReportRequest};

pub use kline_core::{
    DataSource, ExtendedHours, KlineConnector, KlineError, ReportConfig, Step, TradingCalendar,
    Verbosity,
};
