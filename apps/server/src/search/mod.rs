//! Search parameter parsing and translation.

pub mod date_filter;
pub mod params;
pub mod query;

pub use date_filter::{DateBounds, DateFilter, DatePrefix};
pub use params::SearchParams;
pub use query::{
    build_observation_query, build_patient_query, ObservationQuery, PatientQuery, ReadingFilter,
    OBSERVATION_SEARCH_PARAMS, PATIENT_SEARCH_PARAMS,
};
