//! In-process `ClinicalStore` implementation.
//!
//! Holds the three tables in ordered maps behind one lock and evaluates
//! search predicates with the query types' own `matches`. Backs the
//! integration tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    db::traits::ClinicalStore,
    models::{
        BloodPressureRow, HeartRateRow, NewPatient, ObservationId, ObservationSource, PatientRow,
        Reading,
    },
    search::{ObservationQuery, PatientQuery},
    Error, Result,
};

#[derive(Debug, Default)]
struct Tables {
    patients: BTreeMap<i64, PatientRow>,
    blood_pressure: BTreeMap<i64, BloodPressureRow>,
    heart_rate: BTreeMap<i64, HeartRateRow>,
}

/// In-memory store with the same match semantics as the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryClinicalStore {
    tables: RwLock<Tables>,
}

impl InMemoryClinicalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blood-pressure row and return its id. The patient must exist.
    pub fn insert_blood_pressure(
        &self,
        patient_id: i64,
        systolic: i32,
        diastolic: i32,
        date: NaiveDate,
    ) -> Result<i64> {
        let mut tables = self.write()?;
        ensure_patient(&tables, patient_id)?;
        let id = next_id(&tables.blood_pressure);
        tables.blood_pressure.insert(
            id,
            BloodPressureRow {
                id,
                patient_id,
                systolic,
                diastolic,
                date,
            },
        );
        Ok(id)
    }

    /// Add a heart-rate row and return its id. The patient must exist.
    pub fn insert_heart_rate(&self, patient_id: i64, rate: i32, date: NaiveDate) -> Result<i64> {
        let mut tables = self.write()?;
        ensure_patient(&tables, patient_id)?;
        let id = next_id(&tables.heart_rate);
        tables.heart_rate.insert(
            id,
            HeartRateRow {
                id,
                patient_id,
                rate,
                date,
            },
        );
        Ok(id)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
    }
}

fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

fn ensure_patient(tables: &Tables, patient_id: i64) -> Result<()> {
    if tables.patients.contains_key(&patient_id) {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "reading references missing patient {patient_id}"
        )))
    }
}

#[async_trait]
impl ClinicalStore for InMemoryClinicalStore {
    async fn search_patients(&self, query: &PatientQuery) -> Result<Vec<PatientRow>> {
        let tables = self.read()?;
        Ok(tables
            .patients
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect())
    }

    async fn get_patient(&self, id: i64) -> Result<Option<PatientRow>> {
        Ok(self.read()?.patients.get(&id).cloned())
    }

    async fn insert_patient(&self, patient: &NewPatient) -> Result<PatientRow> {
        let mut tables = self.write()?;
        let id = next_id(&tables.patients);
        let row = PatientRow {
            id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            date_of_birth: patient.date_of_birth,
        };
        tables.patients.insert(id, row.clone());
        Ok(row)
    }

    async fn patient_exists(&self, id: i64) -> Result<bool> {
        Ok(self.read()?.patients.contains_key(&id))
    }

    async fn fetch_readings(&self, query: &ObservationQuery) -> Result<Vec<Reading>> {
        let tables = self.read()?;
        let filter = &query.filter;
        let mut readings = Vec::new();

        if let Some(patient_id) = filter.patient_id {
            if !tables.patients.contains_key(&patient_id) {
                tracing::debug!(patient_id, "Observation search for unknown patient");
                return Ok(readings);
            }
        }

        for source in &query.sources {
            match source {
                ObservationSource::BloodPressure => readings.extend(
                    tables
                        .blood_pressure
                        .values()
                        .filter(|row| filter.matches(row.patient_id, row.date))
                        .cloned()
                        .map(Reading::BloodPressure),
                ),
                ObservationSource::HeartRate => readings.extend(
                    tables
                        .heart_rate
                        .values()
                        .filter(|row| filter.matches(row.patient_id, row.date))
                        .cloned()
                        .map(Reading::HeartRate),
                ),
            }
        }
        Ok(readings)
    }

    async fn get_reading(&self, id: ObservationId) -> Result<Option<Reading>> {
        let tables = self.read()?;
        Ok(match id.source {
            ObservationSource::BloodPressure => tables
                .blood_pressure
                .get(&id.row_id)
                .cloned()
                .map(Reading::BloodPressure),
            ObservationSource::HeartRate => tables
                .heart_rate
                .get(&id.row_id)
                .cloned()
                .map(Reading::HeartRate),
        })
    }

    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }
}
