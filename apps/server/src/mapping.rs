//! Row ⇄ resource mapping.
//!
//! Pure functions: rows in, resources out, and the reverse for create
//! payloads. No I/O happens here.

use crate::{
    models::{
        BloodPressureRow, CodeableConcept, Coding, HeartRateRow, HumanName, NewPatient,
        Observation, ObservationComponent, PartialDate, Patient, PatientRow,
        Quantity, Reading, Reference, LOINC_SYSTEM, UCUM_SYSTEM,
    },
    Error, Result,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

pub fn to_patient_resource(row: &PatientRow) -> Patient {
    Patient {
        resource_type: "Patient",
        id: row.id.to_string(),
        name: vec![HumanName {
            text: Some(format!("{} {}", row.first_name, row.last_name)),
            family: Some(row.last_name.clone()),
            given: vec![row.first_name.clone()],
        }],
        birth_date: row.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

pub fn to_observation_resource(reading: &Reading) -> Observation {
    let source = reading.source();
    let mut observation = Observation {
        resource_type: "Observation",
        id: reading.observation_id().to_string(),
        status: "final",
        code: CodeableConcept {
            coding: vec![Coding {
                system: LOINC_SYSTEM,
                code: source.loinc_code(),
                display: source.loinc_display(),
            }],
            text: source.code_text().to_string(),
        },
        subject: Reference {
            reference: format!("Patient/{}", reading.patient_id()),
        },
        effective_date_time: reading.date().format("%Y-%m-%d").to_string(),
        value_quantity: None,
        component: Vec::new(),
    };

    match reading {
        Reading::BloodPressure(row) => observation.component = blood_pressure_components(row),
        Reading::HeartRate(row) => observation.value_quantity = Some(heart_rate_quantity(row)),
    }
    observation
}

fn blood_pressure_components(row: &BloodPressureRow) -> Vec<ObservationComponent> {
    vec![
        ObservationComponent {
            code: loinc_concept("8480-6", "Systolic blood pressure", "systolic"),
            value_quantity: mm_hg(row.systolic),
        },
        ObservationComponent {
            code: loinc_concept("8462-4", "Diastolic blood pressure", "diastolic"),
            value_quantity: mm_hg(row.diastolic),
        },
    ]
}

fn heart_rate_quantity(row: &HeartRateRow) -> Quantity {
    Quantity {
        value: row.rate,
        unit: "beats/minute",
        system: UCUM_SYSTEM,
        code: "/min",
    }
}

fn loinc_concept(code: &'static str, display: &'static str, text: &str) -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding {
            system: LOINC_SYSTEM,
            code,
            display,
        }],
        text: text.to_string(),
    }
}

fn mm_hg(value: i32) -> Quantity {
    Quantity {
        value,
        unit: "mmHg",
        system: UCUM_SYSTEM,
        code: "mm[Hg]",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientPayload {
    resource_type: Option<String>,
    #[serde(default)]
    name: Option<Vec<HumanName>>,
    birth_date: Option<String>,
}

/// Validate a Patient create body and extract the columns to insert.
pub fn from_create_patient_payload(payload: &JsonValue) -> Result<NewPatient> {
    if !payload.is_object() {
        return Err(Error::Validation(
            "Patient payload must be a JSON object".to_string(),
        ));
    }

    let parsed = PatientPayload::deserialize(payload)
        .map_err(|e| Error::Validation(format!("Malformed Patient resource: {e}")))?;

    if let Some(resource_type) = parsed.resource_type.as_deref() {
        if resource_type != "Patient" {
            return Err(Error::Validation(format!(
                "Expected resourceType 'Patient', got '{resource_type}'"
            )));
        }
    }

    let name = parsed
        .name
        .as_ref()
        .and_then(|names| names.first())
        .ok_or_else(|| Error::Validation("Patient must include at least one name".to_string()))?;

    let last_name = name
        .family
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("Patient name must include a family name".to_string()))?;

    let first_name = name
        .given
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("Patient name must include a given name".to_string()))?;

    let date_of_birth = match parsed.birth_date.as_deref() {
        None => None,
        Some(raw) => {
            let date = PartialDate::parse(raw)
                .map_err(|e| Error::Validation(format!("Invalid birthDate: {e}")))?;
            let full = date.as_full_date().ok_or_else(|| {
                Error::Validation(format!(
                    "Invalid birthDate: '{raw}' is a partial date; a full YYYY-MM-DD date is required"
                ))
            })?;
            Some(full)
        }
    };

    Ok(NewPatient {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth,
    })
}
