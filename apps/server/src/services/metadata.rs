//! CapabilityStatement for `GET /fhir/metadata`

use crate::{config::Config, search::{OBSERVATION_SEARCH_PARAMS, PATIENT_SEARCH_PARAMS}};
use serde_json::{json, Value as JsonValue};

pub const FHIR_VERSION: &str = "4.0.1";

/// Builds the CapabilityStatement once at startup and serves it as-is.
pub struct MetadataService {
    capability_statement: JsonValue,
}

impl MetadataService {
    pub fn new(config: &Config) -> Self {
        Self {
            capability_statement: build_capability_statement(config),
        }
    }

    pub fn capability_statement(&self) -> &JsonValue {
        &self.capability_statement
    }
}

fn build_capability_statement(config: &Config) -> JsonValue {
    let cs = &config.fhir.capability_statement;
    let base_url = config.public_base_url();

    let mut statement = json!({
        "resourceType": "CapabilityStatement",
        "id": cs.id,
        "name": cs.name,
        "title": cs.title,
        "status": "active",
        "experimental": false,
        "date": chrono::Utc::now().format("%Y-%m-%d").to_string(),
        "publisher": cs.publisher,
        "description": cs.description,
        "kind": "instance",
        "software": {
            "name": cs.software_name,
            "version": cs.software_version
        },
        "implementation": {
            "description": cs.title
        },
        "fhirVersion": FHIR_VERSION,
        "format": ["json"],
        "rest": [{
            "mode": "server",
            "resource": [
                resource_capability("Patient", &["read", "search-type", "create"], PATIENT_SEARCH_PARAMS),
                resource_capability("Observation", &["read", "search-type"], OBSERVATION_SEARCH_PARAMS)
            ]
        }]
    });

    if let Some(base) = base_url {
        statement["url"] = json!(format!("{base}/metadata"));
        statement["implementation"]["url"] = json!(base);
    }
    if let Some(email) = cs.contact_email.as_deref() {
        statement["contact"] = json!([{ "telecom": [{ "system": "email", "value": email }] }]);
    }

    statement
}

fn resource_capability(resource_type: &str, interactions: &[&str], params: &[&str]) -> JsonValue {
    json!({
        "type": resource_type,
        "interaction": interactions
            .iter()
            .map(|code| json!({ "code": code }))
            .collect::<Vec<_>>(),
        "searchParam": params
            .iter()
            .map(|name| json!({ "name": name, "type": search_param_type(name) }))
            .collect::<Vec<_>>()
    })
}

fn search_param_type(name: &str) -> &'static str {
    match name {
        "given" | "family" => "string",
        "birthdate" | "date" => "date",
        "patient" => "reference",
        _ => "token",
    }
}
