use std::sync::Arc;

use folio_blob::{BlobConfig, BlobStore, MemoryBlobStore};
use folio_core::{DataStore, MemoryDataStore};
use folio_portfolio::{ImageBatchUploader, ImageCollectionManager, ProjectCatalog};

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct FolioState {
    pub store: Arc<dyn DataStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub blob_config: BlobConfig,
}

impl FolioState {
    pub fn new(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>, blob_config: BlobConfig) -> Self {
        Self {
            store,
            blobs,
            blob_config,
        }
    }

    /// Both stores in process memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryDataStore::portfolio()),
            Arc::new(MemoryBlobStore::default()),
            BlobConfig::default(),
        )
    }

    pub fn catalog(&self) -> ProjectCatalog {
        ProjectCatalog::new(self.store.clone())
    }

    pub fn collection(&self, project_id: i64) -> ImageCollectionManager {
        ImageCollectionManager::new(self.store.clone(), project_id)
    }

    pub fn uploader(&self) -> ImageBatchUploader {
        ImageBatchUploader::new(self.store.clone(), self.blobs.clone(), &self.blob_config)
    }
}
