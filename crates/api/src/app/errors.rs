use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use foodshed_catalog::CatalogError;
use foodshed_core::DomainError;

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Domain(e) => domain_error_to_response(e),
        CatalogError::Storage(msg) => {
            tracing::error!(error = %msg, "catalog storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::DanglingReference(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "dangling_reference", message)
        }
        DomainError::InsufficientData { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_data", message)
        }
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

/// A JSON body or query string that could not be extracted (missing field,
/// wrong type, malformed syntax).
pub fn rejection_to_response(rejection: impl std::fmt::Display) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        rejection.to_string(),
    )
}

/// A blocking catalog call that panicked or was cancelled.
pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "catalog task failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "catalog task failed",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
