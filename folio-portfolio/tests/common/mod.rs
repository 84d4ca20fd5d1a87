#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use folio_blob::{BlobConfig, BlobError, BlobResult, BlobStore, MemoryBlobStore, PutResult};
use folio_core::{
    from_rows, to_row, DataStore, Filter, FolioError, FolioResult, MemoryDataStore, ProjectImage,
    Query, Row, PROJECT_IMAGES,
};
use folio_portfolio::{ImageBatchUploader, ImageCollectionManager, PendingUpload};
use serde_json::json;

/// Memory blob store that refuses the put with the given 0-based index.
#[derive(Default)]
pub struct FlakyBlobs {
    pub inner: MemoryBlobStore,
    pub fail_on_put: Option<usize>,
    puts: AtomicUsize,
}

impl FlakyBlobs {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_on_put: Some(index),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FlakyBlobs {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> BlobResult<PutResult> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        if Some(n) == self.fail_on_put {
            return Err(BlobError::rejected(key, 500, "storage offline"));
        }
        self.inner.put(bucket, key, content_type, bytes).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }
}

/// Memory data store with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryDataStore,
    pub fail_insert_at: Option<usize>,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    inserts: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_insert_at(index: usize) -> Self {
        Self {
            fail_insert_at: Some(index),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataStore for FlakyStore {
    async fn select(&self, table: &str, query: &Query) -> FolioResult<Vec<Row>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(FolioError::unavailable("data store offline"));
        }
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> FolioResult<Vec<Row>> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst);
        if Some(n) == self.fail_insert_at {
            return Err(FolioError::bad_gateway("insert rejected"));
        }
        self.inner.insert(table, rows).await
    }

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> FolioResult<Vec<Row>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FolioError::unavailable("data store offline"));
        }
        self.inner.update(table, patch, filter).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> FolioResult<Vec<Row>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FolioError::unavailable("data store offline"));
        }
        self.inner.delete(table, filter).await
    }
}

pub fn config() -> BlobConfig {
    BlobConfig::new()
}

pub fn uploader(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>) -> ImageBatchUploader {
    ImageBatchUploader::new(store, blobs, &config())
}

pub fn file(name: &str) -> PendingUpload {
    PendingUpload::new(name, Bytes::from(name.as_bytes().to_vec())).with_content_type("image/png")
}

/// Insert images with fixed ids and orders for `project_id`.
pub async fn seed_images(store: &dyn DataStore, project_id: i64, images: &[(i64, i64)]) {
    let rows = images
        .iter()
        .map(|(id, order)| {
            to_row(&json!({
                "id": id,
                "project_id": project_id,
                "image_url": format!("memory://blobs/seed/{id}.png"),
                "caption": null,
                "order": order,
            }))
            .unwrap()
        })
        .collect();
    store.insert(PROJECT_IMAGES, rows).await.unwrap();
}

pub async fn stored_images(store: &dyn DataStore, project_id: i64) -> Vec<ProjectImage> {
    let rows = store
        .select(PROJECT_IMAGES, &ImageCollectionManager::display_query(project_id))
        .await
        .unwrap();
    from_rows(rows).unwrap()
}

pub fn ids(images: &[ProjectImage]) -> Vec<i64> {
    images.iter().map(|i| i.id).collect()
}

pub fn orders(images: &[ProjectImage]) -> Vec<i64> {
    images.iter().map(|i| i.order).collect()
}
