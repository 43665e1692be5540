//! HTTP API layer

pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Media type for every FHIR response body.
pub const FHIR_JSON: &str = "application/fhir+json";

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_body_size;
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/fhir", routes::fhir_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::middleware::from_fn(
                    middleware::security::security_headers_middleware,
                ))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([header::LOCATION]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Serialize `body` as a FHIR JSON response.
pub(crate) fn fhir_response(status: StatusCode, body: impl Serialize) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    response
}
