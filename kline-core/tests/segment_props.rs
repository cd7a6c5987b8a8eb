use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::America::New_York;
use kline_core::{Sample, Session, TradingCalendar, segment};
use proptest::prelude::*;

const MIDNIGHT: i64 = 1_704_171_600; // 2024-01-02T05:00:00Z, 00:00 ET

fn t(sec: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(sec, 0).unwrap()
}

// Offsets spill into the neighbouring days; each sample's close is its index.
fn arb_series() -> impl Strategy<Value = Vec<Sample>> {
    proptest::collection::vec(-7_200i64..(26 * 3_600), 0..300).prop_map(|mut offsets| {
        offsets.sort_unstable();
        offsets
            .into_iter()
            .enumerate()
            .map(|(i, off)| {
                #[allow(clippy::cast_precision_loss)]
                let px = i as f64;
                Sample::new(t(MIDNIGHT + off), px, px, px, px)
            })
            .collect()
    })
}

fn in_extended_day(ts: DateTime<Utc>, date: NaiveDate) -> bool {
    let local = ts.with_timezone(&New_York);
    local.date_naive() == date && (4..20).contains(&local.hour())
}

proptest! {
    #[test]
    fn sessions_partition_the_extended_day(samples in arb_series()) {
        let cal = TradingCalendar::us_equities();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let split = segment(&samples, date, &cal);

        let ids = |sess| -> Vec<f64> {
            split.get(sess).iter().filter_map(|s| s.close).collect()
        };
        let pre = ids(Session::PreMarket);
        let reg = ids(Session::Regular);
        let post = ids(Session::AfterHours);

        for id in &pre {
            prop_assert!(!reg.contains(id) && !post.contains(id));
        }
        for id in &reg {
            prop_assert!(!post.contains(id));
        }

        let joined: Vec<Sample> = [Session::PreMarket, Session::Regular, Session::AfterHours]
            .into_iter()
            .flat_map(|sess| split.get(sess).iter().copied())
            .collect();
        let expected: Vec<Sample> = samples
            .iter()
            .copied()
            .filter(|s| in_extended_day(s.ts, date))
            .collect();
        prop_assert_eq!(joined, expected);
    }
}
