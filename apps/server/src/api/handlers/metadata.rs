use crate::{api::fhir_response, state::AppState};
use axum::{extract::State, http::StatusCode, response::Response};

/// `GET /fhir/metadata`
pub async fn capabilities(State(state): State<AppState>) -> Response {
    fhir_response(
        StatusCode::OK,
        state.metadata_service.capability_statement(),
    )
}
