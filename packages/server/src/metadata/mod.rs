mod error;
mod store;

use async_trait::async_trait;

use crate::config::ListOrder;
use crate::entity::file_detail;

pub use error::MetadataError;
pub use store::SeaOrmMetadataStore;

/// A `filedetails` row.
pub type FileRecord = file_detail::Model;

/// Relational side of a stored file, keyed by filename.
///
/// Every method is a single statement; nothing here spans the blob store.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, record: &FileRecord) -> Result<(), MetadataError>;

    async fn select_all(&self, order: ListOrder) -> Result<Vec<FileRecord>, MetadataError>;

    /// Filenames of every record, for reconciliation.
    async fn select_names(&self) -> Result<Vec<String>, MetadataError>;

    /// Rewrite the key, path and description of the record named `old_name`.
    ///
    /// Returns [`MetadataError::NotFound`] when no row matched.
    async fn update_name_and_description(
        &self,
        old_name: &str,
        new_name: &str,
        filepath: &str,
        description: &str,
    ) -> Result<FileRecord, MetadataError>;

    /// Returns [`MetadataError::NotFound`] when no row matched.
    async fn delete_by_name(&self, name: &str) -> Result<(), MetadataError>;
}
