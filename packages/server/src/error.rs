use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

use crate::coordinator::{Intent, IntentError, PhaseFailure};
use crate::metadata::MetadataError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `"error"`.
    #[schema(example = "error")]
    pub message: &'static str,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `PAYLOAD_TOO_LARGE`, `STORE_FAILURE`, `METADATA_FAILURE`,
    /// `TIMEOUT`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "File not found")]
    pub description: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    /// Blob I/O failed. Carries the public description and the logged detail.
    StoreFailure {
        description: &'static str,
        detail: String,
    },
    /// The metadata database failed.
    MetadataFailure {
        description: &'static str,
        detail: String,
    },
    Timeout(String),
    Internal(String),
}

fn body(code: &'static str, description: String) -> ErrorBody {
    ErrorBody {
        message: "error",
        code,
        description,
    }
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, body("CONFLICT", msg)),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                body("PAYLOAD_TOO_LARGE", msg),
            ),
            AppError::StoreFailure {
                description,
                detail,
            } => {
                tracing::error!("Blob store failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("STORE_FAILURE", description.into()),
                )
            }
            AppError::MetadataFailure {
                description,
                detail,
            } => {
                tracing::error!("Metadata failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    body("METADATA_FAILURE", description.into()),
                )
            }
            AppError::Timeout(detail) => {
                tracing::error!("Store timeout: {}", detail);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    body("TIMEOUT", "Storage did not respond in time".into()),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", "An unexpected error occurred".into()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

/// Public wording for a 5xx on each intent.
fn failure_description(intent: Intent, failure: &PhaseFailure) -> &'static str {
    match (intent, failure) {
        (Intent::Upload, PhaseFailure::Metadata(_)) => "DB insert failed",
        (Intent::Upload, _) => "File write failed",
        (Intent::List, _) => "Could not fetch files",
        (Intent::Download, _) => "Could not read file",
        (Intent::Delete, _) => "Could not delete file",
        (Intent::Rename, _) => "Could not rename file",
        (Intent::Reconcile, _) => "Could not reconcile stores",
    }
}

impl From<IntentError> for AppError {
    fn from(err: IntentError) -> Self {
        let IntentError { intent, failure } = err;
        let description = failure_description(intent, &failure);
        let detail = format!("{intent}: {failure}");

        match failure {
            PhaseFailure::Validation(msg) => AppError::Validation(msg),
            PhaseFailure::Store(StorageError::NotFound(_)) => {
                AppError::NotFound("File not found".into())
            }
            PhaseFailure::Metadata(MetadataError::NotFound(_)) => {
                AppError::NotFound("File record not found".into())
            }
            PhaseFailure::Store(StorageError::AlreadyExists(name))
            | PhaseFailure::Metadata(MetadataError::Conflict(name)) => {
                AppError::Conflict(format!("A file named '{name}' already exists"))
            }
            PhaseFailure::Store(StorageError::InvalidName { reason, .. }) => {
                AppError::Validation(reason.message().into())
            }
            PhaseFailure::Store(StorageError::SizeLimitExceeded { limit, .. }) => {
                AppError::PayloadTooLarge(format!("File exceeds maximum size of {limit} bytes"))
            }
            PhaseFailure::Store(StorageError::Io(_)) => AppError::StoreFailure {
                description,
                detail,
            },
            PhaseFailure::Metadata(MetadataError::Database(_)) => AppError::MetadataFailure {
                description,
                detail,
            },
            PhaseFailure::Timeout { .. } => AppError::Timeout(detail),
        }
    }
}
