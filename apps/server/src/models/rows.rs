//! Relational row shapes for the three clinical tables.

use super::{ObservationId, ObservationSource};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Column values for a patient insert; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BloodPressureRow {
    pub id: i64,
    pub patient_id: i64,
    pub systolic: i32,
    pub diastolic: i32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct HeartRateRow {
    pub id: i64,
    pub patient_id: i64,
    pub rate: i32,
    pub date: NaiveDate,
}

/// A row from either reading table, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    BloodPressure(BloodPressureRow),
    HeartRate(HeartRateRow),
}

impl Reading {
    pub fn source(&self) -> ObservationSource {
        match self {
            Reading::BloodPressure(_) => ObservationSource::BloodPressure,
            Reading::HeartRate(_) => ObservationSource::HeartRate,
        }
    }

    pub fn row_id(&self) -> i64 {
        match self {
            Reading::BloodPressure(row) => row.id,
            Reading::HeartRate(row) => row.id,
        }
    }

    pub fn patient_id(&self) -> i64 {
        match self {
            Reading::BloodPressure(row) => row.patient_id,
            Reading::HeartRate(row) => row.patient_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Reading::BloodPressure(row) => row.date,
            Reading::HeartRate(row) => row.date,
        }
    }

    pub fn observation_id(&self) -> ObservationId {
        ObservationId::new(self.source(), self.row_id())
    }

    /// Collection order: date, then source (blood pressure first), then row id.
    pub fn sort_key(&self) -> (NaiveDate, ObservationSource, i64) {
        (self.date(), self.source(), self.row_id())
    }
}
