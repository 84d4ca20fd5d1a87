use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Object storage operations used by the image uploader
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` in `bucket`
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> BlobResult<PutResult>;

    /// Publicly readable URL for an object; no I/O
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Result of a successful put operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    pub key: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
}

/// Strategy for naming uploaded project images
pub trait BlobKeyStrategy: Send + Sync {
    /// Key for the file at `position` in a batch uploaded to `project_id`
    fn object_key(&self, project_id: i64, position: usize, file_name: &str) -> String;
}

/// `<prefix>/<project_id>-<unix micros>-<position>.<ext>`
///
/// The timestamp separates batches, the position separates files in one
/// batch, so keys never collide for a single writer.
#[derive(Debug, Clone)]
pub struct ImageKeyStrategy {
    prefix: String,
}

impl ImageKeyStrategy {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn key_at(&self, project_id: i64, stamp_micros: i64, position: usize, file_name: &str) -> String {
        let file = format!(
            "{}-{}-{}.{}",
            project_id,
            stamp_micros,
            position,
            extension(file_name)
        );
        if self.prefix.is_empty() {
            file
        } else {
            format!("{}/{}", self.prefix, file)
        }
    }
}

impl BlobKeyStrategy for ImageKeyStrategy {
    fn object_key(&self, project_id: i64, position: usize, file_name: &str) -> String {
        let stamp = chrono::Utc::now().timestamp_micros();
        self.key_at(project_id, stamp, position, file_name)
    }
}

/// Lowercased text after the last dot of a file name, `bin` when there is none.
pub fn extension(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "bin".to_string(),
    }
}
