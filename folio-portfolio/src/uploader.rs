//! Batch upload of project images.
//!
//! Files are queued with optional captions, then [`ImageBatchUploader::commit`]
//! walks them in order: store the bytes, resolve the public URL, insert the
//! `project_images` row. A batch appends after the project's current images:
//! the file at position `i` gets `order = current_image_count + i`.
//!
//! There is no rollback. If file `i` fails, files `0..i` stay persisted, no
//! later file is attempted, and the error says how far the batch got.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use folio_blob::{BlobConfig, BlobKeyStrategy, BlobStore, ImageKeyStrategy};
use folio_core::model::blank_to_none;
use folio_core::{to_row, DataStore, NewProjectImage, PROJECT_IMAGES};

use crate::error::{PortfolioError, PortfolioResult};

/// A file waiting for [`ImageBatchUploader::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub caption: String,
}

impl PendingUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
            caption: String::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

pub struct ImageBatchUploader {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    bucket: String,
    pending: Vec<PendingUpload>,
}

impl ImageBatchUploader {
    pub fn new(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>, config: &BlobConfig) -> Self {
        Self {
            store,
            blobs,
            keys: Arc::new(ImageKeyStrategy::new(config.prefix.clone())),
            bucket: config.bucket.clone(),
            pending: Vec::new(),
        }
    }

    /// Append a file; returns its index for [`set_caption`](Self::set_caption).
    /// No I/O and no type or size checks happen here.
    pub fn queue(&mut self, upload: PendingUpload) -> usize {
        self.pending.push(upload);
        self.pending.len() - 1
    }

    pub fn set_caption(&mut self, index: usize, caption: impl Into<String>) -> PortfolioResult<()> {
        let len = self.pending.len();
        let entry = self
            .pending
            .get_mut(index)
            .ok_or(PortfolioError::CaptionIndex { index, len })?;
        entry.caption = caption.into();
        Ok(())
    }

    pub fn pending(&self) -> &[PendingUpload] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Upload every pending file in order and return how many were persisted.
    ///
    /// The pending list is empty afterwards whether or not the batch
    /// succeeded; reload the collection to see what landed.
    #[instrument(skip(self), fields(files = self.pending.len()))]
    pub async fn commit(&mut self, project_id: i64, current_image_count: usize) -> PortfolioResult<usize> {
        let batch = std::mem::take(&mut self.pending);
        if batch.is_empty() {
            debug!("Nothing queued for project {}", project_id);
            return Ok(0);
        }

        let total = batch.len();
        for (position, upload) in batch.into_iter().enumerate() {
            let order = (current_image_count + position) as i64;
            if let Err(source) = self.persist(project_id, position, order, upload).await {
                warn!(
                    "Upload for project {} stopped at file {}: {}",
                    project_id, position, source
                );
                return Err(PortfolioError::BatchFailed {
                    persisted: position,
                    failed_at: position,
                    source: Box::new(source),
                });
            }
        }

        info!("Saved {} image(s) to project {}", total, project_id);
        Ok(total)
    }

    async fn persist(
        &self,
        project_id: i64,
        position: usize,
        order: i64,
        upload: PendingUpload,
    ) -> PortfolioResult<()> {
        let key = self.keys.object_key(project_id, position, &upload.file_name);
        self.blobs
            .put(&self.bucket, &key, upload.content_type.as_deref(), upload.bytes)
            .await?;
        let image_url = self.blobs.public_url(&self.bucket, &key);
        debug!("Stored {} as {}", upload.file_name, key);

        let row = NewProjectImage {
            project_id,
            image_url,
            caption: blank_to_none(Some(upload.caption)),
            order,
        };
        self.store.insert(PROJECT_IMAGES, vec![to_row(&row)?]).await?;
        Ok(())
    }
}
