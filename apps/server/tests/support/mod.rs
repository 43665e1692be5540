//! Shared harness for integration tests.
//!
//! Each test gets a fresh router over an in-memory store loaded with the
//! seed set below, and drives it with `tower::ServiceExt::oneshot`.
//!
//! Seed set:
//! - patients 1..=4: John Smith (1970-05-12), Jane Doe (1985-11-23),
//!   Alice Johnson (1990-02-14), Bob Brown (1962-08-30)
//! - for each patient, one blood-pressure and one heart-rate reading on each
//!   of 2020-01-01, 2020-01-02 and 2020-01-03, inserted patient by patient,
//!   so row id = (patient - 1) * 3 + day in both tables

#![allow(dead_code)]

use anyhow::Context;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use fhir_facade::{
    api::create_router,
    config::Config,
    db::{ClinicalStore, InMemoryClinicalStore},
    models::NewPatient,
    state::AppState,
};
use serde_json::Value;
use std::{future::Future, pin::Pin, sync::Arc};
use tower::ServiceExt;

pub const SEED_PATIENTS: [(&str, &str, (i32, u32, u32)); 4] = [
    ("John", "Smith", (1970, 5, 12)),
    ("Jane", "Doe", (1985, 11, 23)),
    ("Alice", "Johnson", (1990, 2, 14)),
    ("Bob", "Brown", (1962, 8, 30)),
];

/// Heart rates per patient for 2020-01-01..03.
pub const SEED_HEART_RATES: [[i32; 3]; 4] = [[72, 75, 71], [70, 65, 68], [80, 78, 82], [60, 62, 64]];

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryClinicalStore>,
    router: Router,
}

pub type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        send(&self.router, method, uri, body, extra_headers).await
    }

    /// GET `uri` and parse the body as JSON.
    pub async fn get_json(&self, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self.request(Method::GET, uri, None).await?;
        let json = serde_json::from_slice(&body)
            .with_context(|| format!("response to {uri} is not JSON"))?;
        Ok((status, json))
    }
}

/// Drive any router, e.g. one wired over a store other than the seeded one.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Vec<u8>>,
    extra_headers: &[(&str, &str)],
) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/fhir+json");
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .context("failed to build request")?;

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read response body")?;
    Ok((status, headers, bytes))
}

pub async fn with_test_app<F>(test: F) -> anyhow::Result<()>
where
    F: FnOnce(TestApp) -> TestFuture,
{
    with_test_app_with_config(|_| {}, test).await
}

pub async fn with_test_app_with_config<C, F>(configure: C, test: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: FnOnce(TestApp) -> TestFuture,
{
    let mut config = Config::default();
    configure(&mut config);

    let store = Arc::new(seeded_store().await?);
    let state = AppState::with_store(config, store.clone());
    let router = create_router(state.clone());

    test(TestApp {
        state,
        store,
        router,
    })
    .await
}

pub async fn seeded_store() -> anyhow::Result<InMemoryClinicalStore> {
    let store = InMemoryClinicalStore::new();

    for (first, last, (y, m, d)) in SEED_PATIENTS {
        store
            .insert_patient(&NewPatient {
                first_name: first.to_string(),
                last_name: last.to_string(),
                date_of_birth: Some(date(y, m, d)),
            })
            .await?;
    }

    for (index, rates) in SEED_HEART_RATES.iter().enumerate() {
        let patient_id = index as i64 + 1;
        for (day, rate) in (1u32..=3).zip(rates) {
            let offset = patient_id as i32 * 5;
            store.insert_blood_pressure(
                patient_id,
                110 + offset + day as i32,
                70 + offset + day as i32,
                date(2020, 1, day),
            )?;
            store.insert_heart_rate(patient_id, *rate, date(2020, 1, day))?;
        }
    }

    Ok(store)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid seed date")
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

/// Check the searchset envelope and return the entry resources.
pub fn bundle_resources(bundle: &Value) -> anyhow::Result<Vec<Value>> {
    anyhow::ensure!(bundle["resourceType"] == "Bundle", "not a Bundle: {bundle}");
    anyhow::ensure!(bundle["type"] == "searchset", "not a searchset: {bundle}");
    let entries = bundle["entry"]
        .as_array()
        .context("bundle has no entry array")?;
    anyhow::ensure!(
        bundle["total"].as_u64() == Some(entries.len() as u64),
        "total does not match entry count"
    );
    Ok(entries.iter().map(|e| e["resource"].clone()).collect())
}

pub fn bundle_ids(bundle: &Value) -> anyhow::Result<Vec<String>> {
    Ok(bundle_resources(bundle)?
        .iter()
        .filter_map(|r| r["id"].as_str().map(str::to_string))
        .collect())
}

/// Assert a single-issue OperationOutcome with the given issue code.
pub fn assert_operation_outcome(body: &Value, code: &str) {
    assert_eq!(body["resourceType"], "OperationOutcome", "{body}");
    assert_eq!(body["issue"][0]["code"], code, "{body}");
}
