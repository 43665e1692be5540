//! Business logic layer
//!
//! Services turn search parameters and payloads into store calls and map
//! the returned rows into FHIR resources.

pub mod metadata;
pub mod observation;
pub mod patient;

pub use metadata::MetadataService;
pub use observation::ObservationService;
pub use patient::PatientService;
