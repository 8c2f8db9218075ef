//! Two-phase file operations across the blob store and the metadata table.
//!
//! There is no transaction spanning both stores. Each intent runs a fixed
//! sequence, blob store first and metadata second, and the metadata phase
//! decides the reported outcome:
//!
//! | Intent | Phase 1 (blob)               | Phase 2 (metadata, authoritative) |
//! |--------|------------------------------|-----------------------------------|
//! | upload | `store`                      | `insert`                          |
//! | delete | `delete`, missing tolerated  | `delete_by_name`                  |
//! | rename | `rename`, missing tolerated  | `update_name_and_description`     |
//!
//! A failed phase 2 does not undo phase 1. Upload can leave a blob without a
//! record; delete and rename can leave a record without a blob. Both are
//! reported by [`Coordinator::reconcile`].

mod error;
mod locks;

use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::storage::{BlobHandle, BlobStore, StorageError, validate_blob_name};
use tracing::{debug, info, instrument, warn};

use crate::config::ConsistencyConfig;
use crate::metadata::{FileRecord, MetadataStore};
use crate::utils::filename::{MAX_ORIGINAL_LEN, salted_blob_name, upload_blob_name};

pub use error::{Intent, IntentError, Phase, PhaseFailure};
pub use locks::{NameLease, NameLocks};

/// What phase 1 did to the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobOutcome {
    Applied,
    /// The blob was already absent; phase 2 ran anyway.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub blob: BlobOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub record: FileRecord,
    pub blob: BlobOutcome,
}

/// Disagreements between the blob directory and the metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Blobs with no record.
    pub orphaned_blobs: Vec<String>,
    /// Records with no blob.
    pub orphaned_records: Vec<String>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned_blobs.is_empty() && self.orphaned_records.is_empty()
    }
}

pub struct Coordinator {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    policy: ConsistencyConfig,
    locks: Option<NameLocks>,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn validate_name(intent: Intent, name: &str) -> Result<(), IntentError> {
    validate_blob_name(name)
        .map(|_| ())
        .map_err(|e| IntentError::validation(intent, e.message()))
}

/// Phase 1 of delete and rename: a blob that is already gone is logged and
/// the intent carries on. Every other blob failure aborts before phase 2.
fn tolerate_missing_blob<T>(
    intent: Intent,
    name: &str,
    result: Result<T, PhaseFailure>,
) -> Result<Option<T>, IntentError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PhaseFailure::Store(err)) if err.is_not_found() => {
            warn!(%intent, filename = %name, "File not found on disk, continuing with metadata");
            Ok(None)
        }
        Err(failure) => Err(IntentError::new(intent, failure)),
    }
}

async fn bounded<T, E>(
    phase: Phase,
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, PhaseFailure>
where
    PhaseFailure: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(PhaseFailure::from),
        Err(_) => Err(PhaseFailure::Timeout { phase, limit }),
    }
}

impl Coordinator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        policy: ConsistencyConfig,
    ) -> Self {
        let locks = policy.serialize_per_filename.then(NameLocks::new);
        Self {
            blobs,
            metadata,
            policy,
            locks,
        }
    }

    async fn on_blobs<T>(
        &self,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, PhaseFailure> {
        bounded(Phase::Blob, self.policy.blob_timeout(), fut).await
    }

    async fn on_metadata<T>(
        &self,
        fut: impl Future<Output = Result<T, crate::metadata::MetadataError>>,
    ) -> Result<T, PhaseFailure> {
        bounded(Phase::Metadata, self.policy.metadata_timeout(), fut).await
    }

    async fn lock(&self, names: &[&str]) -> Option<NameLease> {
        match &self.locks {
            Some(locks) => Some(locks.acquire(names).await),
            None => None,
        }
    }

    /// Store `data` as a new blob, then insert its record.
    ///
    /// If the insert fails the blob stays on disk and the upload is still
    /// reported as failed.
    #[instrument(skip(self, data, description), fields(size = data.len()))]
    pub async fn upload(
        &self,
        original_name: &str,
        data: &[u8],
        description: &str,
    ) -> Result<FileRecord, IntentError> {
        const INTENT: Intent = Intent::Upload;

        if data.is_empty() {
            return Err(IntentError::validation(INTENT, "Uploaded file is empty"));
        }
        validate_name(INTENT, original_name)?;
        if original_name.len() > MAX_ORIGINAL_LEN {
            return Err(IntentError::validation(
                INTENT,
                format!("Invalid filename: longer than {MAX_ORIGINAL_LEN} bytes"),
            ));
        }

        let (filename, filepath) = self
            .store_new_blob(original_name, data)
            .await
            .map_err(|failure| IntentError::new(INTENT, failure))?;

        let record = FileRecord {
            filename,
            filepath: path_string(&filepath),
            description: description.to_string(),
        };

        if let Err(failure) = self.on_metadata(self.metadata.insert(&record)).await {
            warn!(
                filename = %record.filename,
                error = %failure,
                "Metadata insert failed after blob was stored; blob is orphaned"
            );
            return Err(IntentError::new(INTENT, failure));
        }

        info!(filename = %record.filename, "File uploaded");
        Ok(record)
    }

    async fn store_new_blob(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<(String, std::path::PathBuf), PhaseFailure> {
        let name = upload_blob_name(original_name);
        match self.on_blobs(self.blobs.store(&name, data)).await {
            Ok(path) => Ok((name, path)),
            Err(PhaseFailure::Store(StorageError::AlreadyExists(_))) => {
                let salted = salted_blob_name(original_name);
                debug!(taken = %name, retry = %salted, "Blob name collision");
                let path = self.on_blobs(self.blobs.store(&salted, data)).await?;
                Ok((salted, path))
            }
            Err(failure) => Err(failure),
        }
    }

    /// Every record in the metadata table. Blobs are not consulted.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<FileRecord>, IntentError> {
        self.on_metadata(self.metadata.select_all(self.policy.list_order))
            .await
            .map_err(|failure| IntentError::new(Intent::List, failure))
    }

    /// Open a blob by name. The metadata table is not consulted.
    #[instrument(skip(self))]
    pub async fn download(&self, filename: &str) -> Result<BlobHandle, IntentError> {
        const INTENT: Intent = Intent::Download;
        validate_name(INTENT, filename)?;

        self.on_blobs(self.blobs.retrieve(filename))
            .await
            .map_err(|failure| IntentError::new(INTENT, failure))
    }

    /// Remove the blob if present, then the record.
    ///
    /// A missing record fails the intent with a metadata `NotFound`, even
    /// when a blob was just removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, filename: &str) -> Result<DeleteOutcome, IntentError> {
        const INTENT: Intent = Intent::Delete;
        validate_name(INTENT, filename)?;
        let _lease = self.lock(&[filename]).await;

        let removed = tolerate_missing_blob(
            INTENT,
            filename,
            self.on_blobs(self.blobs.delete(filename)).await,
        )?;
        let blob = match removed {
            Some(()) => BlobOutcome::Applied,
            None => BlobOutcome::Missing,
        };

        if let Err(failure) = self.on_metadata(self.metadata.delete_by_name(filename)).await {
            if blob == BlobOutcome::Applied && !failure.is_not_found() {
                warn!(
                    %filename,
                    error = %failure,
                    "Blob deleted but metadata delete failed; record has no backing file"
                );
            }
            return Err(IntentError::new(INTENT, failure));
        }

        info!(%filename, ?blob, "File deleted");
        Ok(DeleteOutcome { blob })
    }

    /// Rename the blob if present, then rewrite the record's name, path and
    /// description.
    ///
    /// Succeeds without a blob as long as the record update does; the record
    /// then points at a path with nothing behind it.
    #[instrument(skip(self, description))]
    pub async fn rename(
        &self,
        filename: &str,
        new_name: &str,
        description: &str,
    ) -> Result<RenameOutcome, IntentError> {
        const INTENT: Intent = Intent::Rename;
        validate_name(INTENT, filename)?;
        validate_name(INTENT, new_name)?;
        let _lease = self.lock(&[filename, new_name]).await;

        let moved = tolerate_missing_blob(
            INTENT,
            filename,
            self.on_blobs(self.blobs.rename(filename, new_name)).await,
        )?;
        let (blob, filepath) = match moved {
            Some(path) => (BlobOutcome::Applied, path),
            None => (BlobOutcome::Missing, self.blobs.path_for(new_name)),
        };
        let filepath = path_string(&filepath);

        let updated = self
            .on_metadata(self.metadata.update_name_and_description(
                filename,
                new_name,
                &filepath,
                description,
            ))
            .await;

        match updated {
            Ok(record) => {
                info!(%filename, %new_name, ?blob, "File renamed");
                Ok(RenameOutcome { record, blob })
            }
            Err(failure) => {
                if blob == BlobOutcome::Applied {
                    warn!(
                        %filename,
                        %new_name,
                        error = %failure,
                        "Blob renamed but metadata update failed; stores disagree"
                    );
                }
                Err(IntentError::new(INTENT, failure))
            }
        }
    }

    /// Compare blob names against record names. Read-only.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport, IntentError> {
        const INTENT: Intent = Intent::Reconcile;

        let blobs: BTreeSet<String> = self
            .on_blobs(self.blobs.list())
            .await
            .map_err(|failure| IntentError::new(INTENT, failure))?
            .into_iter()
            .collect();
        let records: BTreeSet<String> = self
            .on_metadata(self.metadata.select_names())
            .await
            .map_err(|failure| IntentError::new(INTENT, failure))?
            .into_iter()
            .collect();

        let report = ReconcileReport {
            orphaned_blobs: blobs.difference(&records).cloned().collect(),
            orphaned_records: records.difference(&blobs).cloned().collect(),
        };

        if !report.is_consistent() {
            warn!(
                orphaned_blobs = report.orphaned_blobs.len(),
                orphaned_records = report.orphaned_records.len(),
                "Blob store and metadata disagree"
            );
        }
        Ok(report)
    }
}
