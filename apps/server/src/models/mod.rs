//! Data models: relational rows, FHIR resource shapes, and identity types.

pub mod date;
pub mod observation_id;
pub mod resources;
pub mod rows;

pub use date::PartialDate;
pub use observation_id::{ObservationId, ObservationSource, LOINC_SYSTEM};
pub use resources::{
    Bundle, BundleEntry, CodeableConcept, Coding, HumanName, Observation, ObservationComponent,
    Patient, Quantity, Reference, UCUM_SYSTEM,
};
pub use rows::{BloodPressureRow, HeartRateRow, NewPatient, PatientRow, Reading};
