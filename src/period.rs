use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{format_timestamp, last_day_of_month, quarter_of, start_of_day_utc};
use crate::error::{Error, Result};

static RE_HALF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-H([12])$").unwrap());
static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_ROLLING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})[dD]$").unwrap());

/// Calendar span used by the "to date" periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Year,
    Half,
    Quarter,
    Month,
    Week,
}

/// A reporting window used to bound `created_at` on analytics queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Half(i32, u8),
    Quarter(i32, u8),
    Month(i32, u8),
    /// ISO week.
    Week(i32, u8),
    /// The last N days, ending on (and including) the given date.
    Rolling(u32, NaiveDate),
    /// From the start of the enclosing span through the given date.
    ToDate(Span, NaiveDate),
}

impl Period {
    /// Parse a period string relative to today's UTC date.
    ///
    /// Supported formats:
    /// - `2025`: year
    /// - `2025-H1`: half
    /// - `2025-Q1`: quarter
    /// - `2025-01`: month
    /// - `2025-W05`: ISO week
    /// - `30d`: rolling last N days
    /// - `ytd`, `htd`, `qtd`, `mtd`, `wtd`: span to date
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_as_of(s, chrono::Utc::now().date_naive())
    }

    /// Like [`Period::parse`], with relative periods anchored on `today`.
    pub fn parse_as_of(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        let span = match s.to_lowercase().as_str() {
            "ytd" => Some(Span::Year),
            "htd" => Some(Span::Half),
            "qtd" => Some(Span::Quarter),
            "mtd" => Some(Span::Month),
            "wtd" => Some(Span::Week),
            _ => None,
        };
        if let Some(span) = span {
            return Ok(Period::ToDate(span, today));
        }

        if let Some(caps) = RE_ROLLING.captures(s) {
            let n: u32 = caps[1]
                .parse()
                .map_err(|_| Error::PeriodParse(format!("invalid day count: {s}")))?;
            if n == 0 {
                return Err(Error::PeriodParse("rolling period must cover at least one day".into()));
            }
            return Ok(Period::Rolling(n, today));
        }

        let period = if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
            Period::Year(parse_num(s, "year")?)
        } else if let Some(caps) = RE_HALF.captures(s) {
            Period::Half(parse_num(&caps[1], "year")?, parse_num(&caps[2], "half")?)
        } else if let Some(caps) = RE_QUARTER.captures(s) {
            Period::Quarter(parse_num(&caps[1], "year")?, parse_num(&caps[2], "quarter")?)
        } else if let Some(caps) = RE_WEEK.captures(s) {
            Period::Week(parse_num(&caps[1], "year")?, parse_num(&caps[2], "week")?)
        } else if let Some(caps) = RE_MONTH.captures(s) {
            Period::Month(parse_num(&caps[1], "year")?, parse_num(&caps[2], "month")?)
        } else {
            return Err(Error::PeriodParse(format!("unrecognized period: {s}")));
        };

        // Reject things like 2025-13 or 2021-W53 up front.
        period.date_range()?;
        Ok(period)
    }

    /// Canonical key string, e.g. `2025-Q1` or `30d`.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Half(y, h) => format!("{y}-H{h}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
            Period::ToDate(span, _) => match span {
                Span::Year => "ytd".to_string(),
                Span::Half => "htd".to_string(),
                Span::Quarter => "qtd".to_string(),
                Span::Month => "mtd".to_string(),
                Span::Week => "wtd".to_string(),
            },
        }
    }

    /// Inclusive first and last calendar day covered by this period.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let invalid = || Error::PeriodParse(format!("period out of range: {}", self.to_key()));
        let ymd = |y: i32, m: u32, d: u32| NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid);

        match self {
            Period::Year(y) => Ok((ymd(*y, 1, 1)?, ymd(*y, 12, 31)?)),
            Period::Half(y, h) => match h {
                1 => Ok((ymd(*y, 1, 1)?, ymd(*y, 6, 30)?)),
                2 => Ok((ymd(*y, 7, 1)?, ymd(*y, 12, 31)?)),
                _ => Err(invalid()),
            },
            Period::Quarter(y, q) => {
                if !(1..=4).contains(q) {
                    return Err(invalid());
                }
                let start_month = (*q as u32 - 1) * 3 + 1;
                let end = last_day_of_month(*y, *q as u32 * 3).ok_or_else(invalid)?;
                Ok((ymd(*y, start_month, 1)?, end))
            }
            Period::Month(y, m) => {
                let end = last_day_of_month(*y, *m as u32)
                    .filter(|_| (1..=12).contains(m))
                    .ok_or_else(invalid)?;
                Ok((ymd(*y, *m as u32, 1)?, end))
            }
            Period::Week(y, w) => {
                let start = NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon)
                    .ok_or_else(invalid)?;
                Ok((start, start + Duration::days(6)))
            }
            Period::Rolling(n, as_of) => {
                if *n == 0 {
                    return Err(invalid());
                }
                Ok((*as_of - Duration::days(*n as i64 - 1), *as_of))
            }
            Period::ToDate(span, as_of) => {
                let start = match span {
                    Span::Year => ymd(as_of.year(), 1, 1)?,
                    Span::Half => {
                        let month = if as_of.month() <= 6 { 1 } else { 7 };
                        ymd(as_of.year(), month, 1)?
                    }
                    Span::Quarter => {
                        let month = (quarter_of(*as_of) as u32 - 1) * 3 + 1;
                        ymd(as_of.year(), month, 1)?
                    }
                    Span::Month => ymd(as_of.year(), as_of.month(), 1)?,
                    Span::Week => {
                        *as_of - Duration::days(as_of.weekday().num_days_from_monday() as i64)
                    }
                };
                Ok((start, *as_of))
            }
        }
    }

    /// `created_at_start` / `created_at_end` values for this period.
    ///
    /// Bounds are in UTC. The end is midnight after the last day, so the
    /// whole last day is included.
    pub fn bounds(&self) -> Result<(String, String)> {
        let (start, end) = self.date_range()?;
        Ok((
            format_timestamp(start_of_day_utc(start)),
            format_timestamp(start_of_day_utc(end + Duration::days(1))),
        ))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn parse_num<T: std::str::FromStr>(s: &str, what: &str) -> Result<T> {
    s.parse()
        .map_err(|_| Error::PeriodParse(format!("invalid {what}: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_calendar_periods() {
        assert_eq!(Period::parse("2025").unwrap(), Period::Year(2025));
        assert_eq!(Period::parse("2025-H2").unwrap(), Period::Half(2025, 2));
        assert_eq!(Period::parse("2025-Q1").unwrap(), Period::Quarter(2025, 1));
        assert_eq!(Period::parse("2025-12").unwrap(), Period::Month(2025, 12));
        assert_eq!(Period::parse("2025-W05").unwrap(), Period::Week(2025, 5));
        assert_eq!(Period::parse("2025-W1").unwrap(), Period::Week(2025, 1));
    }

    #[test]
    fn test_parse_relative_periods() {
        let today = date(2026, 2, 7);
        assert_eq!(
            Period::parse_as_of("30d", today).unwrap(),
            Period::Rolling(30, today)
        );
        assert_eq!(
            Period::parse_as_of("QTD", today).unwrap(),
            Period::ToDate(Span::Quarter, today)
        );
        assert_eq!(
            Period::parse_as_of("wtd", today).unwrap(),
            Period::ToDate(Span::Week, today)
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Period::parse("garbage").is_err());
        assert!(Period::parse("2025-Q5").is_err());
        assert!(Period::parse("2025-13").is_err());
        assert!(Period::parse("2025-00").is_err());
        assert!(Period::parse("0d").is_err());
        // 2021 has only 52 ISO weeks.
        assert!(Period::parse("2021-W53").is_err());
        assert!(Period::parse("2020-W53").is_ok());
    }

    #[test]
    fn test_to_key_round_trips() {
        for key in ["2025", "2025-H1", "2025-Q3", "2025-02", "2025-W09"] {
            assert_eq!(Period::parse(key).unwrap().to_key(), key);
        }
        assert_eq!(Period::Rolling(7, date(2025, 1, 1)).to_string(), "7d");
    }

    #[test]
    fn test_date_range_quarter() {
        let (s, e) = Period::Quarter(2025, 2).date_range().unwrap();
        assert_eq!(s, date(2025, 4, 1));
        assert_eq!(e, date(2025, 6, 30));
    }

    #[test]
    fn test_date_range_month_leap_year() {
        let (s, e) = Period::Month(2024, 2).date_range().unwrap();
        assert_eq!(s, date(2024, 2, 1));
        assert_eq!(e, date(2024, 2, 29));
    }

    #[test]
    fn test_date_range_week() {
        let (s, e) = Period::Week(2025, 1).date_range().unwrap();
        assert_eq!(s.weekday(), Weekday::Mon);
        assert_eq!(s, date(2024, 12, 30));
        assert_eq!((e - s).num_days(), 6);
    }

    #[test]
    fn test_date_range_rolling() {
        let (s, e) = Period::Rolling(7, date(2025, 3, 10)).date_range().unwrap();
        assert_eq!(s, date(2025, 3, 4));
        assert_eq!(e, date(2025, 3, 10));
    }

    #[test]
    fn test_date_range_to_date() {
        let today = date(2026, 2, 7); // a Saturday
        let range = |span| Period::ToDate(span, today).date_range().unwrap();
        assert_eq!(range(Span::Year), (date(2026, 1, 1), today));
        assert_eq!(range(Span::Half), (date(2026, 1, 1), today));
        assert_eq!(range(Span::Quarter), (date(2026, 1, 1), today));
        assert_eq!(range(Span::Month), (date(2026, 2, 1), today));
        assert_eq!(range(Span::Week), (date(2026, 2, 2), today));
    }

    #[test]
    fn test_bounds_cover_last_day() {
        let (start, end) = Period::Quarter(2021, 1).bounds().unwrap();
        assert_eq!(start, "2021-01-01T00:00:00Z");
        assert_eq!(end, "2021-04-01T00:00:00Z");

        let (start, end) = Period::Year(2024).bounds().unwrap();
        assert_eq!(start, "2024-01-01T00:00:00Z");
        assert_eq!(end, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_out_of_range_variant_is_error() {
        assert!(Period::Half(2025, 3).date_range().is_err());
        assert!(Period::Month(2025, 0).bounds().is_err());
    }
}
