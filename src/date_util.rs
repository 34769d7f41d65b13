use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1).map(|d| d - Duration::days(1))
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// Midnight UTC at the start of `d`.
pub fn start_of_day_utc(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

/// Format a timestamp the way the analytics API expects (`2021-01-01T15:00:32Z`).
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalize a user-supplied bound to an ISO-8601 timestamp.
///
/// Accepts a bare date (`2021-01-06`, read as midnight UTC) or a full
/// RFC 3339 timestamp, which is converted to UTC.
pub fn parse_timestamp(input: &str) -> Result<String> {
    let s = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(format_timestamp(start_of_day_utc(d)));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|ts| format_timestamp(ts.with_timezone(&Utc)))
        .map_err(|_| {
            Error::PeriodParse(format!(
                "expected YYYY-MM-DD or an RFC 3339 timestamp, got '{s}'"
            ))
        })
}
