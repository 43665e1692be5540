//! Patient interactions: search-type, read, create

use super::{full_url, search_params, RawSearchQuery};
use crate::{api::fhir_response, models::Bundle, state::AppState, Error, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::Value as JsonValue;

/// `GET /fhir/Patient`
pub async fn search_patients(
    State(state): State<AppState>,
    query: RawSearchQuery,
) -> Result<Response> {
    let params = search_params(query)?;
    let patients = state.patient_service.search(&params).await?;

    let bundle = Bundle::searchset(patients, |p| full_url(&state.config, "Patient", &p.id));
    Ok(fhir_response(StatusCode::OK, bundle))
}

/// `GET /fhir/Patient/:id`
pub async fn read_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let patient = state.patient_service.get(&id).await?;
    Ok(fhir_response(StatusCode::OK, patient))
}

/// `POST /fhir/Patient`
///
/// The body is taken raw so malformed JSON surfaces as an OperationOutcome.
pub async fn create_patient(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let payload: JsonValue = serde_json::from_slice(&body)
        .map_err(|e| Error::Validation(format!("Request body is not valid JSON: {e}")))?;

    let patient = state.patient_service.create(&payload).await?;

    let location = match state.config.public_base_url() {
        Some(base) => format!("{base}/Patient/{}", patient.id),
        None => format!("/fhir/Patient/{}", patient.id),
    };
    let location = HeaderValue::from_str(&location)
        .map_err(|e| Error::Internal(format!("Invalid Location header: {e}")))?;

    let mut response = fhir_response(StatusCode::CREATED, patient);
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}
