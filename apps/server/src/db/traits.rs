//! Clinical store trait definition

use crate::{
    models::{NewPatient, ObservationId, PatientRow, Reading},
    search::{ObservationQuery, PatientQuery},
    Result,
};
use async_trait::async_trait;

/// Read/write access to the patients, blood_pressure and heart_rate tables.
///
/// Lookups return `Option`; turning a miss into a not-found error is the
/// service layer's job.
#[async_trait]
pub trait ClinicalStore: Send + Sync {
    /// Patients matching every predicate in `query`, ordered by id.
    async fn search_patients(&self, query: &PatientQuery) -> Result<Vec<PatientRow>>;

    async fn get_patient(&self, id: i64) -> Result<Option<PatientRow>>;

    /// Insert a patient and return the stored row with its assigned id.
    async fn insert_patient(&self, patient: &NewPatient) -> Result<PatientRow>;

    async fn patient_exists(&self, id: i64) -> Result<bool>;

    /// Readings from every table in `query.sources` that pass `query.filter`.
    /// All tables are read from one snapshot; order is unspecified.
    ///
    /// When the filter names a patient, its existence is checked in that same
    /// snapshot first and a missing patient yields no rows without touching
    /// the reading tables.
    async fn fetch_readings(&self, query: &ObservationQuery) -> Result<Vec<Reading>>;

    async fn get_reading(&self, id: ObservationId) -> Result<Option<Reading>>;

    /// Health check
    async fn ping(&self) -> Result<()>;
}
