//! FHIR `date` values of year, month or day precision.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A FHIR `date`: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialDate {
    Year(i32),
    YearMonth(i32, u32),
    Day(NaiveDate),
}

impl PartialDate {
    /// Parse a FHIR date. The layout is strict: four-digit year, two-digit
    /// month and day, `-` separators, and the day must exist in the calendar.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split('-').collect();
        let invalid = || format!("'{raw}' is not a valid date (expected YYYY, YYYY-MM or YYYY-MM-DD)");

        let year = match parts.first() {
            Some(y) if is_digits(y, 4) => y.parse::<i32>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        if year == 0 {
            return Err(invalid());
        }

        let month = match parts.get(1) {
            None => return Ok(PartialDate::Year(year)),
            Some(m) if is_digits(m, 2) => m.parse::<u32>().map_err(|_| invalid())?,
            Some(_) => return Err(invalid()),
        };
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        let day = match parts.get(2) {
            None => return Ok(PartialDate::YearMonth(year, month)),
            Some(d) if is_digits(d, 2) => d.parse::<u32>().map_err(|_| invalid())?,
            Some(_) => return Err(invalid()),
        };
        if parts.len() > 3 {
            return Err(invalid());
        }

        NaiveDate::from_ymd_opt(year, month, day)
            .map(PartialDate::Day)
            .ok_or_else(|| format!("'{raw}' is not a valid calendar date"))
    }

    /// Inclusive first and last day covered by this value.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            PartialDate::Day(day) => (day, day),
            PartialDate::YearMonth(year, month) => {
                let first = first_of_month(year, month);
                let next = if month == 12 {
                    first_of_month(year + 1, 1)
                } else {
                    first_of_month(year, month + 1)
                };
                (first, next.pred_opt().unwrap_or(first))
            }
            PartialDate::Year(year) => (first_of_month(year, 1), last_of_year(year)),
        }
    }

    pub fn as_full_date(&self) -> Option<NaiveDate> {
        match *self {
            PartialDate::Day(day) => Some(day),
            _ => None,
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialDate::Year(y) => write!(f, "{y:04}"),
            PartialDate::YearMonth(y, m) => write!(f, "{y:04}-{m:02}"),
            PartialDate::Day(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), d.month(), d.day()),
        }
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

// Callers have validated year and month, so these dates always exist.
fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

fn last_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}
