//! US equities trading calendar.
//!
//! Session boundaries are fixed civil times in the exchange timezone:
//! pre-market `[04:00, 09:30)`, regular `[09:30, 16:00)`, after-hours
//! `[16:00, 20:00)`. Weekends are closed; exchange holidays are not modelled.

use std::fmt;

use chrono::offset::LocalResult;
use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 3600 + minute * 60
}

/// One of the three named trading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    /// `[04:00, 09:30)` exchange time.
    PreMarket,
    /// `[09:30, 16:00)` exchange time.
    Regular,
    /// `[16:00, 20:00)` exchange time.
    AfterHours,
}

impl Session {
    /// All sessions in chronological order.
    pub const ALL: [Self; 3] = [Self::PreMarket, Self::Regular, Self::AfterHours];

    /// Display name used in report section headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreMarket => "Pre-Market",
            Self::Regular => "Regular Market",
            Self::AfterHours => "After-Hours",
        }
    }

    /// True for pre-market and after-hours.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        !matches!(self, Self::Regular)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Market phase at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketPhase {
    /// Pre-market session.
    PreMarket,
    /// Regular session.
    Regular,
    /// After-hours session.
    AfterHours,
    /// Weekend or outside `[04:00, 20:00)`.
    Closed,
}

impl From<Session> for MarketPhase {
    fn from(s: Session) -> Self {
        match s {
            Session::PreMarket => Self::PreMarket,
            Session::Regular => Self::Regular,
            Session::AfterHours => Self::AfterHours,
        }
    }
}

/// Weekday calendar with fixed session boundaries in one timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingCalendar {
    tz: Tz,
    // Seconds since local midnight.
    pre_open: u32,
    regular_open: u32,
    regular_close: u32,
    post_close: u32,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::us_equities()
    }
}

impl TradingCalendar {
    /// NYSE/Nasdaq hours in `America/New_York`.
    #[must_use]
    pub const fn us_equities() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            pre_open: hm(4, 0),
            regular_open: hm(9, 30),
            regular_close: hm(16, 0),
            post_close: hm(20, 0),
        }
    }

    /// Exchange timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Session containing the exchange-local time of day, if any.
    #[must_use]
    pub fn session_of(&self, time: NaiveTime) -> Option<Session> {
        let secs = time.num_seconds_from_midnight();
        if secs < self.pre_open || secs >= self.post_close {
            None
        } else if secs < self.regular_open {
            Some(Session::PreMarket)
        } else if secs < self.regular_close {
            Some(Session::Regular)
        } else {
            Some(Session::AfterHours)
        }
    }

    /// Session containing `instant`, ignoring the day of week.
    #[must_use]
    pub fn session_at(&self, instant: DateTime<Utc>) -> Option<Session> {
        self.session_of(instant.with_timezone(&self.tz).time())
    }

    /// Market phase at `instant`.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self), ret))]
    #[must_use]
    pub fn classify(&self, instant: DateTime<Utc>) -> MarketPhase {
        let local = instant.with_timezone(&self.tz);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketPhase::Closed;
        }
        self.session_of(local.time())
            .map_or(MarketPhase::Closed, MarketPhase::from)
    }

    /// Whether extended-hours sessions are shown when the user did not say.
    ///
    /// They are hidden only while the regular session is open.
    #[must_use]
    pub fn default_show_extended_hours(&self, instant: DateTime<Utc>) -> bool {
        self.classify(instant) != MarketPhase::Regular
    }

    /// Exchange-local civil date of `instant`.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// UTC instants bounding `session` on `date`, as `[start, end)`.
    #[must_use]
    pub fn session_bounds(
        &self,
        date: NaiveDate,
        session: Session,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let (from, to) = match session {
            Session::PreMarket => (self.pre_open, self.regular_open),
            Session::Regular => (self.regular_open, self.regular_close),
            Session::AfterHours => (self.regular_close, self.post_close),
        };
        (self.at(date, from), self.at(date, to))
    }

    /// UTC instants bounding the whole exchange-local day `date`.
    #[must_use]
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(date);
        (self.at(date, 0), self.at(next, 0))
    }

    /// UTC instant of the exchange-local wall-clock `time` on `date`.
    #[must_use]
    pub fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        local_to_utc(self.tz, date.and_time(time))
    }

    fn at(&self, date: NaiveDate, secs: u32) -> DateTime<Utc> {
        let time =
            NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN);
        local_to_utc(self.tz, date.and_time(time))
    }
}

/// Resolve an exchange-local civil time to UTC.
///
/// Ambiguous times take the earlier mapping; times skipped by a DST jump use
/// the offset in force at that wall-clock reading.
pub(crate) fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&naive).fix().local_minus_utc();
            Utc.from_utc_datetime(&naive) - chrono::Duration::seconds(i64::from(offset))
        }
    }
}
