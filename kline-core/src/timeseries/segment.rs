use chrono::{DateTime, NaiveDate, Utc};

use crate::session::{Session, TradingCalendar};
use crate::types::Sample;

/// One trading day's samples split into the three named sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSplit {
    date: NaiveDate,
    calendar: TradingCalendar,
    pre_market: Vec<Sample>,
    regular: Vec<Sample>,
    after_hours: Vec<Sample>,
}

impl SessionSplit {
    /// Exchange-local date the split was built for.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Samples in `session`, in arrival order.
    #[must_use]
    pub fn get(&self, session: Session) -> &[Sample] {
        match session {
            Session::PreMarket => &self.pre_market,
            Session::Regular => &self.regular,
            Session::AfterHours => &self.after_hours,
        }
    }

    /// Start of `session` on this date; the bucket origin for its K-lines.
    #[must_use]
    pub fn session_start(&self, session: Session) -> DateTime<Utc> {
        self.calendar.session_bounds(self.date, session).0
    }

    /// Total samples kept across all sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pre_market.len() + self.regular.len() + self.after_hours.len()
    }

    /// True when no sample fell inside any session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `samples` into pre-market, regular, and after-hours by exchange-local
/// time of day.
///
/// Samples dated on another exchange-local day, or outside `[04:00, 20:00)`,
/// are discarded. Relative order within each session is preserved.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(samples, calendar), fields(samples = samples.len()))
)]
pub fn segment(samples: &[Sample], date: NaiveDate, calendar: &TradingCalendar) -> SessionSplit {
    let mut split = SessionSplit {
        date,
        calendar: *calendar,
        pre_market: Vec::new(),
        regular: Vec::new(),
        after_hours: Vec::new(),
    };
    let tz = calendar.timezone();
    for s in samples {
        let local = s.ts.with_timezone(&tz);
        if local.date_naive() != date {
            continue;
        }
        match calendar.session_of(local.time()) {
            Some(Session::PreMarket) => split.pre_market.push(*s),
            Some(Session::Regular) => split.regular.push(*s),
            Some(Session::AfterHours) => split.after_hours.push(*s),
            None => {}
        }
    }
    split
}
