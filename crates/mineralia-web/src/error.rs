use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use mineralia_core::CatalogError;
use mineralia_core::error::ErrorPayload;

pub fn catalog_error_response(
    err: CatalogError,
    operation: &str,
    mineral: Option<String>,
) -> Response {
    let status = status_for_catalog_error(&err);
    let payload = err.to_payload(operation, mineral);
    if status.is_server_error() {
        tracing::error!(
            operation,
            code = payload.code.as_str(),
            trace_id = payload.trace_id.as_str(),
            error = %err,
            "catalog request failed"
        );
    }
    (status, Json(payload)).into_response()
}

/// Malformed path or query input that never reached the catalog.
pub fn bad_request_response(operation: &str, field: &str, message: String) -> Response {
    let payload = ErrorPayload {
        code: "VALIDATION_FAILED".to_string(),
        message,
        operation: operation.to_string(),
        trace_id: Uuid::new_v4().to_string(),
        mineral: None,
        details: Some(json!({ "field": field })),
    };
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn status_for_catalog_error(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::DataIntegrity(_)
        | CatalogError::Io(_)
        | CatalogError::Json(_)
        | CatalogError::Yaml(_)
        | CatalogError::Sqlite(_)
        | CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
