//! Prefixed date search values (`birthdate=ge1980`, `date=2020-01-02`).

use crate::models::PartialDate;
use chrono::NaiveDate;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

/// Comparison prefix on a date search value. Absent prefix means `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePrefix {
    #[default]
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for DatePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatePrefix::Eq => "eq",
            DatePrefix::Lt => "lt",
            DatePrefix::Le => "le",
            DatePrefix::Gt => "gt",
            DatePrefix::Ge => "ge",
        };
        f.write_str(s)
    }
}

impl FromStr for DatePrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(DatePrefix::Eq),
            "lt" => Ok(DatePrefix::Lt),
            "le" => Ok(DatePrefix::Le),
            "gt" => Ok(DatePrefix::Gt),
            "ge" => Ok(DatePrefix::Ge),
            other => Err(format!("unsupported comparison prefix '{other}'")),
        }
    }
}

/// Parsed date search value: operator plus operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub prefix: DatePrefix,
    pub value: PartialDate,
}

/// Inclusive/exclusive day bounds a [`DateFilter`] admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub lower: Bound<NaiveDate>,
    pub upper: Bound<NaiveDate>,
}

impl DateFilter {
    /// Parse `[prefix]date`. A value that starts with a letter must start
    /// with one of the supported two-letter prefixes.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let starts_alpha = raw.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

        let (prefix, rest) = if starts_alpha {
            let split = raw
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphabetic())
                .map(|(i, _)| i)
                .unwrap_or(raw.len());
            let (prefix, rest) = raw.split_at(split);
            (prefix.parse::<DatePrefix>()?, rest)
        } else {
            (DatePrefix::Eq, raw)
        };

        Ok(Self {
            prefix,
            value: PartialDate::parse(rest)?,
        })
    }

    /// Bounds against the day range the operand covers: `eq` is inside the
    /// range, `lt`/`gt` fall strictly outside it, `le`/`ge` include it.
    pub fn bounds(&self) -> DateBounds {
        let (first, last) = self.value.range();
        match self.prefix {
            DatePrefix::Eq => DateBounds {
                lower: Bound::Included(first),
                upper: Bound::Included(last),
            },
            DatePrefix::Lt => DateBounds {
                lower: Bound::Unbounded,
                upper: Bound::Excluded(first),
            },
            DatePrefix::Le => DateBounds {
                lower: Bound::Unbounded,
                upper: Bound::Included(last),
            },
            DatePrefix::Gt => DateBounds {
                lower: Bound::Excluded(last),
                upper: Bound::Unbounded,
            },
            DatePrefix::Ge => DateBounds {
                lower: Bound::Included(first),
                upper: Bound::Unbounded,
            },
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        let DateBounds { lower, upper } = self.bounds();
        let above = match lower {
            Bound::Included(d) => date >= d,
            Bound::Excluded(d) => date > d,
            Bound::Unbounded => true,
        };
        let below = match upper {
            Bound::Included(d) => date <= d,
            Bound::Excluded(d) => date < d,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.value)
    }
}
