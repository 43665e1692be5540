//! Search parameter translation into store predicates.
//!
//! The query types here are the complete predicate set for a search. Stores
//! compile them (Postgres) or evaluate them with `matches` (in-memory), so
//! both backends agree on match semantics:
//!
//! - `given` / `family`: case-insensitive substring, repeats ANDed
//! - `birthdate` / `date`: [`DateFilter`], repeats ANDed
//! - `patient`: exact patient id
//! - `code`: selects which reading tables take part in the union

use super::{DateFilter, SearchParams};
use crate::{
    models::{ObservationSource, PatientRow, Reading},
    Error, Result,
};
use chrono::NaiveDate;

pub const PATIENT_SEARCH_PARAMS: &[&str] = &["given", "family", "birthdate"];
pub const OBSERVATION_SEARCH_PARAMS: &[&str] = &["patient", "code", "date"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    pub given: Vec<String>,
    pub family: Vec<String>,
    pub birthdate: Vec<DateFilter>,
}

impl PatientQuery {
    pub fn matches(&self, row: &PatientRow) -> bool {
        self.given.iter().all(|g| contains_ignore_case(&row.first_name, g))
            && self.family.iter().all(|f| contains_ignore_case(&row.last_name, f))
            && (self.birthdate.is_empty()
                || row
                    .date_of_birth
                    .is_some_and(|dob| self.birthdate.iter().all(|f| f.matches(dob))))
    }
}

/// Predicates shared by both reading tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingFilter {
    pub patient_id: Option<i64>,
    pub date: Vec<DateFilter>,
}

impl ReadingFilter {
    pub fn matches(&self, patient_id: i64, date: NaiveDate) -> bool {
        self.patient_id.map_or(true, |p| p == patient_id) && self.date.iter().all(|f| f.matches(date))
    }

    pub fn matches_reading(&self, reading: &Reading) -> bool {
        self.matches(reading.patient_id(), reading.date())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationQuery {
    /// Reading tables to query, in union order. Empty when `code` named
    /// nothing this server holds.
    pub sources: Vec<ObservationSource>,
    pub filter: ReadingFilter,
}

impl Default for ObservationQuery {
    fn default() -> Self {
        Self {
            sources: ObservationSource::ALL.to_vec(),
            filter: ReadingFilter::default(),
        }
    }
}

impl ObservationQuery {
    pub fn includes(&self, source: ObservationSource) -> bool {
        self.sources.contains(&source)
    }
}

pub fn build_patient_query(params: &SearchParams) -> Result<PatientQuery> {
    log_unrecognized("Patient", params, PATIENT_SEARCH_PARAMS);

    Ok(PatientQuery {
        given: params.values("given").map(str::to_string).collect(),
        family: params.values("family").map(str::to_string).collect(),
        birthdate: date_filters(params, "birthdate")?,
    })
}

pub fn build_observation_query(params: &SearchParams) -> Result<ObservationQuery> {
    log_unrecognized("Observation", params, OBSERVATION_SEARCH_PARAMS);

    let patient_id = params.single("patient")?.map(parse_patient_reference).transpose()?;

    let sources = match params.single("code")? {
        None => ObservationSource::ALL.to_vec(),
        Some(raw) => {
            let mut sources: Vec<ObservationSource> = raw
                .split(',')
                .filter_map(|token| ObservationSource::from_code(token.trim()))
                .collect();
            sources.sort();
            sources.dedup();
            sources
        }
    };

    Ok(ObservationQuery {
        sources,
        filter: ReadingFilter {
            patient_id,
            date: date_filters(params, "date")?,
        },
    })
}

/// Accepts `123` or `Patient/123`.
fn parse_patient_reference(raw: &str) -> Result<i64> {
    let id = raw.strip_prefix("Patient/").unwrap_or(raw);
    let invalid = || {
        Error::InvalidSearchParameter(format!(
            "patient: '{raw}' is not a Patient id or Patient/<id> reference"
        ))
    };
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    id.parse::<i64>().map_err(|_| invalid())
}

fn date_filters(params: &SearchParams, name: &str) -> Result<Vec<DateFilter>> {
    params
        .values(name)
        .map(|raw| {
            DateFilter::parse(raw)
                .map_err(|e| Error::InvalidSearchParameter(format!("{name}: {e}")))
        })
        .collect()
}

fn log_unrecognized(resource_type: &str, params: &SearchParams, known: &[&str]) {
    let ignored = params.unrecognized(known);
    if !ignored.is_empty() {
        tracing::debug!(resource_type, ignored = ?ignored, "Ignoring unsupported search parameters");
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
