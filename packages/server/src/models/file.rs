use serde::Serialize;

use crate::coordinator::{DeleteOutcome, ReconcileReport};
use crate::metadata::FileRecord;

/// Generic success envelope: `{"message": "success", "description": ...}`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    #[schema(example = "success")]
    pub message: &'static str,
    #[schema(example = "file renamed successfully")]
    pub description: &'static str,
}

impl StatusResponse {
    pub fn success(description: &'static str) -> Self {
        Self {
            message: "success",
            description,
        }
    }
}

/// Response DTO for a completed upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "success")]
    pub message: &'static str,
    #[schema(example = "File uploaded!")]
    pub description: &'static str,
    /// Name the file is stored under.
    #[schema(example = "1712000000000-report.pdf")]
    pub filename: String,
    #[schema(example = "/opt/data/uploads/1712000000000-report.pdf")]
    pub filepath: String,
}

impl From<FileRecord> for UploadResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            message: "success",
            description: "File uploaded!",
            filename: record.filename,
            filepath: record.filepath,
        }
    }
}

/// Response DTO for one `filedetails` row.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileRecordResponse {
    #[schema(example = "1712000000000-report.pdf")]
    pub filename: String,
    #[schema(example = "/opt/data/uploads/1712000000000-report.pdf")]
    pub filepath: String,
    #[schema(example = "Q1 report")]
    pub description: String,
}

impl From<FileRecord> for FileRecordResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            filename: record.filename,
            filepath: record.filepath,
            description: record.description,
        }
    }
}

/// Response DTO for a delete.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    #[schema(example = "success")]
    pub message: &'static str,
    #[schema(example = "file deleted successfully")]
    pub description: &'static str,
    /// Whether a blob was actually removed from disk.
    pub blob_removed: bool,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            message: "success",
            description: "file deleted successfully",
            blob_removed: outcome.blob == crate::coordinator::BlobOutcome::Applied,
        }
    }
}

/// Differences between the blob directory and the metadata table.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReconcileResponse {
    /// Blobs on disk with no `filedetails` row.
    pub orphaned_blobs: Vec<String>,
    /// `filedetails` rows with no blob on disk.
    pub orphaned_records: Vec<String>,
    pub consistent: bool,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(report: ReconcileReport) -> Self {
        let consistent = report.is_consistent();
        Self {
            orphaned_blobs: report.orphaned_blobs,
            orphaned_records: report.orphaned_records,
            consistent,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}
