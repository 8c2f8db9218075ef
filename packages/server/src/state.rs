use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::coordinator::Coordinator;
use crate::metadata::MetadataStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let coordinator = Coordinator::new(blobs, metadata, config.consistency.clone());
        Self {
            config,
            coordinator: Arc::new(coordinator),
        }
    }
}
