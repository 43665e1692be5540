use crate::api::handlers::{metadata, observation, patient};
use crate::state::AppState;
use axum::{routing::get, Router};

/// FHIR REST routes, mounted under `/fhir`.
pub fn fhir_routes() -> Router<AppState> {
    Router::new()
        .route("/metadata", get(metadata::capabilities))
        // Patient
        .route(
            "/Patient",
            get(patient::search_patients).post(patient::create_patient),
        )
        .route("/Patient/:id", get(patient::read_patient))
        // Observation
        .route("/Observation", get(observation::search_observations))
        .route("/Observation/:id", get(observation::read_observation))
}
