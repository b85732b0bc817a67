//! Calendar features derived from message timestamps.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::config::DatasetConfig;

/// Derived columns for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalFeatures {
    pub week_id: String,
    pub hour: u32,
    pub day_of_week: u32,
    pub is_after_hours: bool,
    pub is_weekend: bool,
}

/// After-hours test: `hour >= start || hour < end`.
///
/// This suits a window that wraps midnight (18 → 7). With a non-wrapping
/// window such as 9 → 17 nearly every hour is flagged.
pub fn is_after_hours(hour: u32, start: u32, end: u32) -> bool {
    hour >= start || hour < end
}

/// Compute features for a whole column of timestamps at once.
pub fn compute(timestamps: &[NaiveDateTime], dataset: &DatasetConfig) -> Vec<TemporalFeatures> {
    timestamps
        .iter()
        .map(|ts| {
            let hour = ts.hour();
            let day_of_week = ts.weekday().num_days_from_monday();
            TemporalFeatures {
                week_id: ts.format("%G-W%V").to_string(),
                hour,
                day_of_week,
                is_after_hours: is_after_hours(
                    hour,
                    dataset.after_hours_start,
                    dataset.after_hours_end,
                ),
                is_weekend: dataset.weekend_days.contains(&day_of_week),
            }
        })
        .collect()
}
