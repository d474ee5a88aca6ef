// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Drop sub-second precision so stored dates order correctly as strings.
pub fn to_stored_precision(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(0)
}

/// Which end of a day a bare `YYYY-MM-DD` value stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Parse an RFC3339 timestamp or a bare `YYYY-MM-DD` date.
///
/// A bare date resolves to the first or last second of that UTC day.
pub fn parse_date_param(raw: &str, bound: DayBound) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_stored_precision(dt.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_opt(23, 59, 59)?,
    };
    Some(date.and_time(time).and_utc())
}

/// Inclusive `[first second, last second]` of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = next.and_time(NaiveTime::MIN).and_utc() - chrono::Duration::seconds(1);
    Some((start, end))
}

/// `YYYY-MM-DD` key for the UTC day of a timestamp.
pub fn date_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
