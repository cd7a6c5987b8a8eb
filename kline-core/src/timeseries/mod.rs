//! Time-series utilities used by the report pipeline.
//!
//! - `segment`: split one day's samples by trading session
//! - `resample`: aggregate samples into fixed-width minute or day buckets

use chrono::{DateTime, Utc};

use crate::types::Sample;

/// Fixed-width minute and calendar-day resampling.
pub mod resample;
/// Trading-session segmentation of a single day.
pub mod segment;

/// Drop samples stamped before `from`, keeping the rest in order.
pub fn retain_from(samples: &mut Vec<Sample>, from: DateTime<Utc>) {
    samples.retain(|s| s.ts >= from);
}
