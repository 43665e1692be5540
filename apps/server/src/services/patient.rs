//! Patient service - search, read and create over the patients table

use crate::{
    db::ClinicalStore,
    mapping::{from_create_patient_payload, to_patient_resource},
    models::Patient,
    search::{build_patient_query, SearchParams},
    Error, Result,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub struct PatientService {
    store: Arc<dyn ClinicalStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn ClinicalStore>) -> Self {
        Self { store }
    }

    /// Patients matching every supplied parameter, ordered by id.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Patient>> {
        let query = build_patient_query(params)?;
        let rows = self.store.search_patients(&query).await?;

        tracing::debug!(matches = rows.len(), "Patient search completed");
        Ok(rows.iter().map(to_patient_resource).collect())
    }

    /// Read by logical id. Ids that are not integers cannot exist, so they
    /// report not-found rather than a validation error.
    pub async fn get(&self, id: &str) -> Result<Patient> {
        let row_id = parse_patient_id(id).ok_or_else(|| Error::not_found("Patient", id))?;

        self.store
            .get_patient(row_id)
            .await?
            .map(|row| to_patient_resource(&row))
            .ok_or_else(|| Error::not_found("Patient", id))
    }

    pub async fn create(&self, payload: &JsonValue) -> Result<Patient> {
        let new_patient = from_create_patient_payload(payload)?;
        let row = self.store.insert_patient(&new_patient).await?;

        tracing::info!(patient_id = row.id, "Patient created");
        Ok(to_patient_resource(&row))
    }
}

fn parse_patient_id(id: &str) -> Option<i64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if id.len() > 1 && id.starts_with('0') {
        return None;
    }
    id.parse().ok()
}
