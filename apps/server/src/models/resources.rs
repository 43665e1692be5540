//! Serialized FHIR resource shapes produced by the facade.
//!
//! Only the elements this server populates are modelled. Optional elements
//! are omitted from JSON when empty.

use serde::{Deserialize, Serialize};

pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub resource_type: &'static str,
    pub id: String,
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub resource_type: &'static str,
    pub id: String,
    pub status: &'static str,
    pub code: CodeableConcept,
    pub subject: Reference,
    pub effective_date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<ObservationComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coding {
    pub system: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub value: i32,
    pub unit: &'static str,
    pub system: &'static str,
    pub code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationComponent {
    pub code: CodeableConcept,
    pub value_quantity: Quantity,
}

/// `searchset` Bundle wrapping the matches of a search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle<T> {
    pub resource_type: &'static str,
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub total: usize,
    pub entry: Vec<BundleEntry<T>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry<T> {
    pub full_url: String,
    pub resource: T,
}

impl<T> Bundle<T> {
    /// Build a searchset; `full_url` derives each entry's `fullUrl`.
    pub fn searchset(resources: Vec<T>, full_url: impl Fn(&T) -> String) -> Self {
        let entry: Vec<BundleEntry<T>> = resources
            .into_iter()
            .map(|resource| BundleEntry {
                full_url: full_url(&resource),
                resource,
            })
            .collect();
        Self {
            resource_type: "Bundle",
            type_: "searchset",
            total: entry.len(),
            entry,
        }
    }
}
