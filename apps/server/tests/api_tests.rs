//! Health, capability statement and cross-cutting HTTP behaviour

mod support;

use async_trait::async_trait;
use axum::http::{header, Method, StatusCode};
use fhir_facade::{
    api::create_router,
    config::Config,
    db::ClinicalStore,
    models::{NewPatient, ObservationId, PatientRow, Reading},
    search::{ObservationQuery, PatientQuery},
    state::AppState,
    Error,
};
use std::sync::Arc;
use support::*;

/// Store whose every call fails as if the pool were exhausted.
struct UnavailableStore;

fn unavailable() -> Error {
    Error::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ClinicalStore for UnavailableStore {
    async fn search_patients(&self, _: &PatientQuery) -> fhir_facade::Result<Vec<PatientRow>> {
        Err(unavailable())
    }

    async fn get_patient(&self, _: i64) -> fhir_facade::Result<Option<PatientRow>> {
        Err(unavailable())
    }

    async fn insert_patient(&self, _: &NewPatient) -> fhir_facade::Result<PatientRow> {
        Err(unavailable())
    }

    async fn patient_exists(&self, _: i64) -> fhir_facade::Result<bool> {
        Err(unavailable())
    }

    async fn fetch_readings(&self, _: &ObservationQuery) -> fhir_facade::Result<Vec<Reading>> {
        Err(unavailable())
    }

    async fn get_reading(&self, _: ObservationId) -> fhir_facade::Result<Option<Reading>> {
        Err(unavailable())
    }

    async fn ping(&self) -> fhir_facade::Result<()> {
        Err(unavailable())
    }
}

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, body) = app.get_json("/health").await?;
            assert_status(status, StatusCode::OK, "health");
            assert_eq!(body["status"], "ok");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn metadata_describes_both_resources() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, headers, body) = app.request(Method::GET, "/fhir/metadata", None).await?;
            assert_status(status, StatusCode::OK, "metadata");
            assert_eq!(headers[header::CONTENT_TYPE], "application/fhir+json");

            let cs: serde_json::Value = serde_json::from_slice(&body)?;
            assert_eq!(cs["resourceType"], "CapabilityStatement");
            assert_eq!(cs["status"], "active");
            assert_eq!(cs["fhirVersion"], "4.0.1");
            assert_eq!(cs["format"][0], "json");
            assert_eq!(cs["software"]["name"], "fhir-facade");

            let types: Vec<_> = cs["rest"][0]["resource"]
                .as_array()
                .map(|rs| rs.iter().filter_map(|r| r["type"].as_str()).collect())
                .unwrap_or_default();
            assert_eq!(types, vec!["Patient", "Observation"]);
            assert_eq!(&cs, app.state.metadata_service.capability_statement());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn security_headers_are_present() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, headers, _body) = app.request(Method::GET, "/fhir/Patient/1", None).await?;
            assert_status(status, StatusCode::OK, "read");

            for (name, expected) in [
                ("x-content-type-options", "nosniff"),
                ("x-frame-options", "DENY"),
                ("referrer-policy", "no-referrer"),
                ("content-security-policy", "default-src 'none'"),
            ] {
                let got = headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                assert_eq!(got, expected, "missing/incorrect header '{}'", name);
            }

            // HSTS should not be set for plain HTTP requests.
            assert!(headers.get("strict-transport-security").is_none());

            let (_, headers, _) = app
                .request_with_extra_headers(
                    Method::GET,
                    "/health",
                    None,
                    &[("x-forwarded-proto", "https")],
                )
                .await?;
            assert!(headers.get("strict-transport-security").is_some());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn cors_allows_only_configured_origins() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, headers, _body) = app
                .request_with_extra_headers(
                    Method::GET,
                    "/health",
                    None,
                    &[("origin", "https://evil.example")],
                )
                .await?;
            assert_status(status, StatusCode::OK, "health");
            assert!(
                headers.get("access-control-allow-origin").is_none(),
                "expected no permissive CORS by default"
            );

            let (_, headers, _body) = app
                .request_with_extra_headers(
                    Method::GET,
                    "/health",
                    None,
                    &[("origin", "http://localhost:3000")],
                )
                .await?;
            assert_eq!(
                headers["access-control-allow-origin"],
                "http://localhost:3000"
            );
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn oversized_bodies_are_refused() -> anyhow::Result<()> {
    with_test_app_with_config(
        |config| config.server.max_request_body_size = 64,
        |app| {
            Box::pin(async move {
                let padding = "x".repeat(256);
                let payload = serde_json::json!({
                    "resourceType": "Patient",
                    "name": [{ "family": padding, "given": ["Ann"] }]
                });
                let (status, _, _) = app
                    .request(Method::POST, "/fhir/Patient", Some(to_json_body(&payload)?))
                    .await?;
                assert_status(status, StatusCode::PAYLOAD_TOO_LARGE, "oversized create");
                Ok(())
            })
        },
    )
    .await
}

#[tokio::test]
async fn storage_failures_become_opaque_server_errors() -> anyhow::Result<()> {
    let state = AppState::with_store(Config::default(), Arc::new(UnavailableStore));
    let router = create_router(state);

    let payload = serde_json::json!({
        "resourceType": "Patient",
        "name": [{ "family": "Lee", "given": ["Ann"] }]
    });
    let requests = [
        (Method::GET, "/fhir/Patient?family=Lee", None),
        (Method::POST, "/fhir/Patient", Some(to_json_body(&payload)?)),
        (Method::GET, "/fhir/Observation?patient=1", None),
        (Method::GET, "/fhir/Observation/hr-1", None),
    ];

    for (method, uri, body) in requests {
        let context = format!("{method} {uri}");
        let (status, headers, body) = send(&router, method, uri, body, &[]).await?;
        assert_status(status, StatusCode::INTERNAL_SERVER_ERROR, &context);
        assert_eq!(headers[header::CONTENT_TYPE], "application/fhir+json", "{context}");

        let outcome: serde_json::Value = serde_json::from_slice(&body)?;
        assert_operation_outcome(&outcome, "exception");
        assert_eq!(outcome["issue"][0]["severity"], "fatal", "{context}");
        assert_eq!(
            outcome["issue"][0]["diagnostics"], "Database operation failed",
            "{context}"
        );
        assert!(!outcome.to_string().contains("pool"), "{context}: {outcome}");
    }

    let (status, _, _) = send(&router, Method::GET, "/health", None, &[]).await?;
    assert_status(status, StatusCode::INTERNAL_SERVER_ERROR, "health");
    Ok(())
}
