//! Crate-wide error type and its HTTP rendering.
//!
//! Every failure leaves the server as a FHIR `OperationOutcome` with a single
//! issue. Status mapping:
//!
//! | Error | HTTP | severity / code |
//! |-------|------|-----------------|
//! | `Validation` | 400 | error / invalid |
//! | `InvalidSearchParameter` | 400 | error / invalid |
//! | `ResourceNotFound` | 404 | error / not-found |
//! | `Database` | 500 | fatal / exception |
//! | `Internal` | 500 | fatal / exception |

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed create payload.
    #[error("Invalid resource: {0}")]
    Validation(String),

    /// Search parameter value that cannot be translated into a predicate.
    #[error("Invalid search parameter: {0}")]
    InvalidSearchParameter(String),

    #[error("{resource_type}/{id} not found")]
    ResourceNotFound { resource_type: String, id: String },

    /// Backing store unavailable or a constraint violation.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(resource_type: &str, id: impl Into<String>) -> Self {
        Error::ResourceNotFound {
            resource_type: resource_type.to_string(),
            id: id.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidSearchParameter(_) => StatusCode::BAD_REQUEST,
            Error::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn issue_code(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::InvalidSearchParameter(_) => "invalid",
            Error::ResourceNotFound { .. } => "not-found",
            Error::Database(_) | Error::Internal(_) => "exception",
        }
    }

    /// Text shown to clients. Storage details stay in the server log.
    fn details(&self) -> String {
        match self {
            Error::Database(_) => "Database operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

/// Single-issue `OperationOutcome`.
pub fn operation_outcome(severity: &str, code: &str, details: &str) -> serde_json::Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": severity,
            "code": code,
            "diagnostics": details,
            "details": { "text": details }
        }]
    })
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let severity = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "fatal"
        } else {
            tracing::debug!(error = %self, "Request rejected");
            "error"
        };

        let body = operation_outcome(severity, self.issue_code(), &self.details());
        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(crate::api::FHIR_JSON),
        );
        response
    }
}
