//! Partial date parsing and temporal similarity.
//!
//! Property values come as Wikidata time literals
//! (`+2010-05-18T00:00:00Z/11`) whose suffix gives the precision
//! (9 = year, 10 = month, 11 = day). Table cells come as ISO dates,
//! partial ISO dates or common textual formats.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tl_model::{Result, TlError, ValueType};

use super::string::split_pieces;

static WIKIDATA_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?(-?\d+)-(\d{2})-(\d{2})T[\d:]+Z?/(\d{1,2})$")
        .expect("Invalid Wikidata time regex")
});

static ISO_PARTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?(-?\d{4})(?:-(\d{1,2})(?:-(\d{1,2}))?)?(?:[T ].*)?$")
        .expect("Invalid ISO 8601 date regex")
});

const TEXT_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d-%b-%Y",  // 15-Jan-2024
    "%d-%B-%Y",  // 15-January-2024
    "%d/%m/%Y",  // European: 15/01/2024
    "%m/%d/%Y",  // US: 01/15/2024
    "%d.%m.%Y",  // German: 15.01.2024
    "%b %d, %Y", // Jan 15, 2024
    "%B %d, %Y", // January 15, 2024
    "%d %b %Y",  // 15 Jan 2024
    "%d %B %Y",  // 15 January 2024
];

/// Granularity a date is known to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A date known to year, month or day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }

    fn truncate(self, precision: DatePrecision) -> Self {
        match precision {
            DatePrecision::Year => Self {
                month: None,
                day: None,
                ..self
            },
            DatePrecision::Month => Self { day: None, ..self },
            DatePrecision::Day => self,
        }
    }

    fn from_parts(year: i32, month: Option<u32>, day: Option<u32>) -> Option<Self> {
        // Wikidata writes unknown components as 00.
        let month = month.filter(|m| *m != 0);
        let day = month.and(day.filter(|d| *d != 0));
        if let Some(m) = month
            && !(1..=12).contains(&m)
        {
            return None;
        }
        if let (Some(m), Some(d)) = (month, day) {
            NaiveDate::from_ymd_opt(year, m, d)?;
        }
        Some(Self { year, month, day })
    }

    fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }
}

/// Parse a full or partial date.
///
/// # Errors
///
/// Returns [`TlError::MalformedValue`] when no supported format matches.
pub fn parse_partial_date(raw: &str) -> Result<PartialDate> {
    let trimmed = raw.trim();
    let malformed = || TlError::malformed(raw, ValueType::Date);

    if let Some(caps) = WIKIDATA_TIME.captures(trimmed) {
        let year = caps[1].parse::<i32>().map_err(|_| malformed())?;
        let month = caps[2].parse::<u32>().ok();
        let day = caps[3].parse::<u32>().ok();
        let precision = match caps[4].parse::<u32>().map_err(|_| malformed())? {
            p if p <= 9 => DatePrecision::Year,
            10 => DatePrecision::Month,
            _ => DatePrecision::Day,
        };
        return PartialDate::from_parts(year, month, day)
            .map(|date| date.truncate(precision))
            .ok_or_else(malformed);
    }

    if let Some(caps) = ISO_PARTIAL.captures(trimmed) {
        let year = caps[1].parse::<i32>().map_err(|_| malformed())?;
        let month = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let day = caps.get(3).and_then(|d| d.as_str().parse::<u32>().ok());
        return PartialDate::from_parts(year, month, day).ok_or_else(malformed);
    }

    for fmt in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(PartialDate::from_naive(date));
        }
    }

    // Month and year only, e.g. "May 2010"
    for fmt in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {trimmed}"), fmt) {
            return Ok(PartialDate {
                day: None,
                ..PartialDate::from_naive(date)
            });
        }
    }

    Err(malformed())
}

/// Closeness of two dates compared at their common precision.
///
/// Equal dates score 1; otherwise the score decays linearly over ten years,
/// twelve months or a year of days, and is 0 below `threshold`.
pub fn date_similarity(a: PartialDate, b: PartialDate, threshold: f64) -> f64 {
    let precision = a.precision().min(b.precision());
    let (a, b) = (a.truncate(precision), b.truncate(precision));
    if a == b {
        return 1.0;
    }
    let sim = match precision {
        DatePrecision::Year => {
            1.0 - (i64::from(a.year) - i64::from(b.year)).abs() as f64 / 10.0
        }
        DatePrecision::Month => {
            let months = |d: PartialDate| i64::from(d.year) * 12 + i64::from(d.month.unwrap_or(1));
            1.0 - (months(a) - months(b)).abs() as f64 / 12.0
        }
        DatePrecision::Day => {
            let to_naive = |d: PartialDate| {
                NaiveDate::from_ymd_opt(d.year, d.month.unwrap_or(1), d.day.unwrap_or(1))
            };
            match (to_naive(a), to_naive(b)) {
                (Some(x), Some(y)) => 1.0 - (x - y).num_days().abs() as f64 / 365.0,
                _ => 0.0,
            }
        }
    };
    let sim = sim.max(0.0);
    if sim >= threshold { sim } else { 0.0 }
}

/// Compare a row context value with a property date.
///
/// # Errors
///
/// Returns [`TlError::MalformedValue`] when either side holds no date.
pub fn compare_dates(context: &str, property: &str, threshold: f64, separator: char) -> Result<f64> {
    let reference = parse_partial_date(property)?;
    let mut parsed = Vec::new();
    if let Ok(whole) = parse_partial_date(context) {
        parsed.push(whole);
    }
    for piece in split_pieces(context, separator) {
        if let Ok(date) = parse_partial_date(&piece) {
            parsed.push(date);
        }
    }
    if parsed.is_empty() {
        return Err(TlError::malformed(context, ValueType::Date));
    }
    Ok(parsed
        .into_iter()
        .map(|date| date_similarity(date, reference, threshold))
        .fold(0.0, f64::max))
}
