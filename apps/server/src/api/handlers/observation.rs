//! Observation interactions: search-type, read

use super::{full_url, search_params, RawSearchQuery};
use crate::{api::fhir_response, models::Bundle, state::AppState, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

/// `GET /fhir/Observation`
pub async fn search_observations(
    State(state): State<AppState>,
    query: RawSearchQuery,
) -> Result<Response> {
    let params = search_params(query)?;
    let observations = state.observation_service.search(&params).await?;

    let bundle = Bundle::searchset(observations, |o| {
        full_url(&state.config, "Observation", &o.id)
    });
    Ok(fhir_response(StatusCode::OK, bundle))
}

/// `GET /fhir/Observation/:id`
pub async fn read_observation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let observation = state.observation_service.get(&id).await?;
    Ok(fhir_response(StatusCode::OK, observation))
}
