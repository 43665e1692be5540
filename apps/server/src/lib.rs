//! FHIR facade over a relational clinical dataset.
//!
//! Patients, blood-pressure readings and heart-rate readings live in three
//! plain tables. This crate presents them as FHIR R4 `Patient` and
//! `Observation` resources: it maps rows to resources, translates FHIR search
//! parameters into store predicates, and validates new patients on create.
//!
//! Layers, leaves first:
//! - [`models`]: row types, resource types, partial dates, composite ids
//! - [`mapping`]: row ⇄ resource conversion
//! - [`search`]: search parameter translation
//! - [`db`]: the [`db::ClinicalStore`] trait with Postgres and in-memory backends
//! - [`services`]: per-resource orchestration
//! - [`api`]: axum routes and handlers

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod search;
pub mod services;
pub mod state;

pub use error::{Error, Result};
