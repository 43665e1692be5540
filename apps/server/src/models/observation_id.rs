//! Observation identity across the two reading tables.
//!
//! Blood-pressure and heart-rate rows each have their own id sequence, so a
//! bare row id is ambiguous. An [`ObservationId`] pairs the row id with the
//! [`ObservationSource`] it came from and renders as `<tag>-<row id>`
//! (`bp-3`, `hr-3`).

use std::fmt;
use std::str::FromStr;

pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// Source table of an Observation. Variant order is the tie-break order for
/// readings sharing a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObservationSource {
    BloodPressure,
    HeartRate,
}

impl ObservationSource {
    pub const ALL: [ObservationSource; 2] =
        [ObservationSource::BloodPressure, ObservationSource::HeartRate];

    /// Prefix used in composite ids.
    pub fn tag(&self) -> &'static str {
        match self {
            ObservationSource::BloodPressure => "bp",
            ObservationSource::HeartRate => "hr",
        }
    }

    /// Value of `code.text` and of the `code` search parameter.
    pub fn code_text(&self) -> &'static str {
        match self {
            ObservationSource::BloodPressure => "blood-pressure",
            ObservationSource::HeartRate => "heart-rate",
        }
    }

    pub fn loinc_code(&self) -> &'static str {
        match self {
            ObservationSource::BloodPressure => "85354-9",
            ObservationSource::HeartRate => "8867-4",
        }
    }

    pub fn loinc_display(&self) -> &'static str {
        match self {
            ObservationSource::BloodPressure => "Blood pressure panel",
            ObservationSource::HeartRate => "Heart rate",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ObservationSource::BloodPressure => "blood_pressure",
            ObservationSource::HeartRate => "heart_rate",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }

    /// Resolve a `code` token: the text code, or the LOINC code with or
    /// without its `http://loinc.org|` system.
    pub fn from_code(token: &str) -> Option<Self> {
        let code = match token.split_once('|') {
            Some((system, code)) if system.is_empty() || system == LOINC_SYSTEM => code,
            Some(_) => return None,
            None => token,
        };
        Self::ALL
            .into_iter()
            .find(|s| s.code_text().eq_ignore_ascii_case(code) || s.loinc_code() == code)
    }
}

/// Composite Observation identifier: source tag plus source-local row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId {
    pub source: ObservationSource,
    pub row_id: i64,
}

impl ObservationId {
    pub fn new(source: ObservationSource, row_id: i64) -> Self {
        Self { source, row_id }
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source.tag(), self.row_id)
    }
}

impl FromStr for ObservationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, raw_id) = s
            .split_once('-')
            .ok_or_else(|| format!("'{s}' is not a <tag>-<id> observation id"))?;
        let source = ObservationSource::from_tag(tag)
            .ok_or_else(|| format!("unknown observation tag '{tag}'"))?;
        if raw_id.is_empty() || !raw_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{raw_id}' is not a numeric row id"));
        }
        // One spelling per row: `bp-01` is not an alias of `bp-1`.
        if raw_id.len() > 1 && raw_id.starts_with('0') {
            return Err(format!("row id '{raw_id}' has leading zeros"));
        }
        let row_id = raw_id
            .parse::<i64>()
            .map_err(|_| format!("row id '{raw_id}' is out of range"))?;
        Ok(Self { source, row_id })
    }
}
