use std::sync::Arc;

use kline_core::{
    ExtendedHours, KlineConnector, KlineError, ReportConfig, Step, TradingCalendar, Verbosity,
};

use crate::clock::{Clock, SystemClock};

/// Report pipeline bound to one connector, one calendar and one clock.
pub struct Reporter {
    pub(crate) connector: Arc<dyn KlineConnector>,
    pub(crate) cfg: ReportConfig,
    pub(crate) calendar: TradingCalendar,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Builder for constructing a [`Reporter`] with custom configuration.
pub struct ReporterBuilder {
    connector: Option<Arc<dyn KlineConnector>>,
    cfg: ReportConfig,
    calendar: TradingCalendar,
    clock: Arc<dyn Clock>,
}

impl Default for ReporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReporterBuilder {
    /// Create a new builder with defaults.
    ///
    /// Starts with no connector, 15-minute steps, long rows, 21 historical
    /// rows, automatic extended-hours display, the US equities calendar and
    /// the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: None,
            cfg: ReportConfig::default(),
            calendar: TradingCalendar::us_equities(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the data source. A later call replaces an earlier one.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn KlineConnector>) -> Self {
        self.connector = Some(c);
        self
    }

    /// Replace the whole report configuration.
    #[must_use]
    pub fn config(mut self, cfg: ReportConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Bucket width. Minute steps give the intraday report, day steps the
    /// historical one.
    #[must_use]
    pub const fn step(mut self, step: Step) -> Self {
        self.cfg.step = step;
        self
    }

    /// Row layout for K-lines and the snapshot block.
    #[must_use]
    pub const fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.cfg.verbosity = verbosity;
        self
    }

    /// Rows kept by the historical report.
    #[must_use]
    pub const fn max_records(mut self, n: usize) -> Self {
        self.cfg.max_records = n;
        self
    }

    /// Extended-hours display policy.
    #[must_use]
    pub const fn extended_hours(mut self, policy: ExtendedHours) -> Self {
        self.cfg.extended_hours = policy;
        self
    }

    /// Trading calendar used for sessions and the extended-hours default.
    #[must_use]
    pub const fn calendar(mut self, calendar: TradingCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Source of "now". Tests pass a [`crate::FixedClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the [`Reporter`].
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connector was set or the step or row limit
    /// is zero.
    pub fn build(self) -> Result<Reporter, KlineError> {
        let Some(connector) = self.connector else {
            return Err(KlineError::InvalidArg(
                "no connector set; add one via with_connector(...)".to_string(),
            ));
        };
        if self.cfg.step.count() == 0 {
            return Err(KlineError::InvalidArg("step must be positive".to_string()));
        }
        if self.cfg.max_records == 0 {
            return Err(KlineError::InvalidArg(
                "max_records must be positive".to_string(),
            ));
        }
        Ok(Reporter {
            connector,
            cfg: self.cfg,
            calendar: self.calendar,
            clock: self.clock,
        })
    }
}

/// Attach the connector name to errors that do not already carry one.
pub(crate) fn tag_err(connector: &str, e: KlineError) -> KlineError {
    match e {
        e @ (KlineError::NotFound { .. }
        | KlineError::Connector { .. }
        | KlineError::Unsupported { .. }) => e,
        other => KlineError::Connector {
            connector: connector.to_string(),
            msg: other.to_string(),
        },
    }
}

impl Reporter {
    /// Start building a new `Reporter`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use kline::{Reporter, Step};
    /// use kline_mock::MockConnector;
    ///
    /// let reporter = Reporter::builder()
    ///     .with_connector(Arc::new(MockConnector::new()))
    ///     .step(Step::Days(5))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> ReporterBuilder {
        ReporterBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.cfg
    }

    /// Connector this reporter fetches from.
    #[must_use]
    pub fn connector(&self) -> &dyn KlineConnector {
        self.connector.as_ref()
    }
}
