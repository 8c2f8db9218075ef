use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::file::{
    DeleteResponse, FileRecordResponse, ReconcileResponse, StatusResponse, UploadResponse,
};
use crate::state::AppState;
use crate::utils::filename::attachment_disposition;

/// Request body cap for uploads. Leaves headroom over the blob limit for the
/// multipart framing and the description field.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(64 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `myfile` multipart field on disk under a timestamp-prefixed name, \
        then records it in `filedetails` with the optional `description` field. \
        If the database insert fails the bytes stay on disk (see `/reconcile`) and the \
        upload is reported as failed.",
    request_body(content_type = "multipart/form-data", description = "`myfile` plus optional `description`"),
    responses(
        (status = 200, description = "File stored and recorded", body = UploadResponse),
        (status = 400, description = "Missing or empty file, bad filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Disk write failed (STORE_FAILURE)", body = ErrorBody),
        (status = 502, description = "DB insert failed (METADATA_FAILURE)", body = ErrorBody),
        (status = 504, description = "A store timed out (TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_name: Option<String> = None;
    let mut file_data = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Multipart error", e))?
    {
        match field.name() {
            Some("myfile") => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Upload read error", e))?,
                );
            }
            Some("description") => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read description", e))?,
                );
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let data = file_data.ok_or_else(|| AppError::Validation("Missing 'myfile' field".into()))?;
    let file_name = file_name
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

    let record = state
        .coordinator
        .upload(&file_name, &data, description.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(UploadResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List file records",
    description = "Returns every `filedetails` row. The blob directory is not checked, so a \
        listed file may have no bytes behind it.",
    responses(
        (status = 200, description = "All file records", body = Vec<FileRecordResponse>),
        (status = 502, description = "Could not fetch files (METADATA_FAILURE)", body = ErrorBody),
        (status = 504, description = "Database timed out (TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileRecordResponse>>, AppError> {
    let records = state.coordinator.list().await?;
    Ok(Json(
        records.into_iter().map(FileRecordResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the blob as an attachment. Looks only at the blob directory; a file \
        with a record but no bytes is 404.",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let handle = state.coordinator.download(&filename).await?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(handle.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, handle.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&filename),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    delete,
    path = "/delete/{filename}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the blob (a missing blob is logged and ignored), then the record. \
        Fails with 404 when there is no record, even if a blob was removed.",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "Record removed", body = DeleteResponse),
        (status = 400, description = "Invalid filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such record (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Disk error (STORE_FAILURE)", body = ErrorBody),
        (status = 502, description = "Database error (METADATA_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let outcome = state.coordinator.delete(&filename).await?;
    Ok(Json(DeleteResponse::from(outcome)))
}

#[utoipa::path(
    put,
    path = "/rename/{filename}/{newname}/{description}",
    tag = "Files",
    operation_id = "renameFile",
    summary = "Rename a file and replace its description",
    description = "Renames the blob (a missing blob is logged and ignored), then rewrites the \
        record. Succeeds without a blob as long as the record exists.",
    params(
        ("filename" = String, Path, description = "Current stored filename"),
        ("newname" = String, Path, description = "New filename"),
        ("description" = String, Path, description = "New description"),
    ),
    responses(
        (status = 200, description = "Record renamed", body = StatusResponse),
        (status = 400, description = "Invalid filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such record (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Target name taken (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Database error (METADATA_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, description))]
pub async fn rename_file(
    State(state): State<AppState>,
    Path((filename, newname, description)): Path<(String, String, String)>,
) -> Result<Json<StatusResponse>, AppError> {
    state
        .coordinator
        .rename(&filename, &newname, &description)
        .await?;
    Ok(Json(StatusResponse::success("file renamed successfully")))
}

#[utoipa::path(
    get,
    path = "/reconcile",
    tag = "Files",
    operation_id = "reconcileFiles",
    summary = "Compare blobs against records",
    description = "Read-only scan listing blobs without a record and records without a blob. \
        Nothing is repaired.",
    responses(
        (status = 200, description = "Reconciliation report", body = ReconcileResponse),
        (status = 500, description = "Disk error (STORE_FAILURE)", body = ErrorBody),
        (status = 502, description = "Database error (METADATA_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let report = state.coordinator.reconcile().await?;
    Ok(Json(ReconcileResponse::from(report)))
}
