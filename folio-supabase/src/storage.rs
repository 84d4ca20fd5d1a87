use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use folio_blob::{BlobError, BlobResult, BlobStore, PutResult};

use crate::client::SupabaseClient;

/// `BlobStore` backed by the hosted storage API.
#[derive(Clone, Debug)]
pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

async fn check(response: reqwest::Response, key: &str) -> BlobResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    warn!("storage rejected {} with {}", key, status);
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(BlobError::not_found(key));
    }
    Err(BlobError::rejected(key, status.as_u16(), body.trim()))
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> BlobResult<PutResult> {
        let size_bytes = bytes.len() as u64;
        let request = self
            .client
            .http()
            .post(self.client.object_url(bucket, key))
            .header(
                CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(bytes);

        let response = self
            .client
            .authorized(request)
            .send()
            .await
            .map_err(BlobError::unavailable)?;
        check(response, key).await?;
        debug!("uploaded {}/{} ({} bytes)", bucket, key, size_bytes);

        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
            etag: None,
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.client.public_object_url(bucket, key)
    }
}
