use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};
use bytes::Bytes;
use tracing::debug;

use crate::{BlobError, BlobResult, BlobStore, PutResult};

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base for public URLs when it differs from `endpoint` (CDN, proxy)
    pub public_base_url: Option<String>,
}

/// Object storage on any S3-compatible service, path-style addressing.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    public_base_url: String,
}

impl S3CompatibleStore {
    pub async fn connect(config: S3Config) -> Self {
        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| config.endpoint.clone())
            .trim_end_matches('/')
            .to_string();
        let client = Self::create_client(config).await;
        Self {
            client,
            public_base_url,
        }
    }

    async fn create_client(config: S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "folio",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint)
            .load()
            .await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build(),
        )
    }

    fn map_sdk_error<E>(key: &str, err: SdkError<E, HttpResponse>) -> BlobError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => BlobError::unavailable(err),
            SdkError::ServiceError(service) => BlobError::rejected(
                key,
                service.raw().status().as_u16(),
                service.err().to_string(),
            ),
            other => BlobError::backend(other),
        }
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> BlobResult<PutResult> {
        let size_bytes = bytes.len() as u64;
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(AwsByteStream::from(bytes));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let result = request
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(key, e))?;
        debug!("Stored s3 object {}/{} ({} bytes)", bucket, key, size_bytes);

        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
            etag: result.e_tag,
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }
}
