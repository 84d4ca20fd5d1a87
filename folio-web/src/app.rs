use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use folio_blob::{BlobConfig, BlobStore, MemoryBlobStore, S3CompatibleStore, S3Config};
use folio_core::{DataStore, FolioConfigSnapshot, FolioError, MemoryDataStore};
use folio_supabase::{PostgrestStore, SupabaseClient, SupabaseStorage};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rest;
use crate::FolioState;

pub struct FolioApp {
    pub config: FolioConfigSnapshot,
    pub state: FolioState,
    pub router: Router<()>,
}

impl FolioApp {
    pub fn new(state: FolioState, config: FolioConfigSnapshot) -> Self {
        let router = rest::routes(state.clone()).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

        Self {
            config,
            state,
            router,
        }
    }

    /// `http.host:http.port`
    pub fn address(&self) -> String {
        let host = self.config.get("http.host").unwrap_or("127.0.0.1");
        let port = self.config.get_u16("http.port").unwrap_or(3030);
        format!("{host}:{port}")
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn blob_config(config: &FolioConfigSnapshot) -> BlobConfig {
    let mut blob = BlobConfig::new();
    if let Some(bucket) = config.get_string("storage.bucket") {
        blob = blob.with_bucket(bucket);
    }
    if let Some(prefix) = config.get_string("storage.prefix") {
        blob = blob.with_prefix(prefix);
    }
    if let Some(mb) = config.get_usize("upload.max_file_mb") {
        blob = blob.with_max_file_mb(mb as u64);
    }
    if let Some(mb) = config.get_usize("upload.max_total_mb") {
        blob = blob.with_max_total_mb(mb as u64);
    }
    blob
}

fn data_store(config: &FolioConfigSnapshot) -> anyhow::Result<Arc<dyn DataStore>> {
    match config.get("backend").unwrap_or("memory") {
        "memory" => Ok(Arc::new(MemoryDataStore::portfolio())),
        "supabase" => {
            let client = SupabaseClient::from_config(config)?;
            Ok(Arc::new(PostgrestStore::new(client)))
        }
        other => Err(FolioError::bad_request(format!("Unknown backend: {other}")).into()),
    }
}

async fn blob_store(config: &FolioConfigSnapshot) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.get("storage.backend").unwrap_or("memory") {
        "memory" => Ok(Arc::new(MemoryBlobStore::default())),
        "supabase" => {
            let client = SupabaseClient::from_config(config)?;
            Ok(Arc::new(SupabaseStorage::new(client)))
        }
        "s3" => {
            let s3 = S3Config {
                endpoint: config.require("s3.endpoint")?,
                region: config
                    .get_string("s3.region")
                    .unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: config.require("s3.access_key_id")?,
                secret_access_key: config.require("s3.secret_access_key")?,
                public_base_url: config.get_string("s3.public_base_url"),
            };
            Ok(Arc::new(S3CompatibleStore::connect(s3).await))
        }
        other => Err(FolioError::bad_request(format!("Unknown storage backend: {other}")).into()),
    }
}

/// Wire stores and routes from configuration.
pub async fn build(config: FolioConfigSnapshot) -> anyhow::Result<FolioApp> {
    let store = data_store(&config).context("configuring data store")?;
    let blobs = blob_store(&config).await.context("configuring object storage")?;
    let blob = blob_config(&config);

    info!(
        "Data store: {}, object storage: {} (bucket {})",
        config.get("backend").unwrap_or("memory"),
        config.get("storage.backend").unwrap_or("memory"),
        blob.bucket
    );

    let state = FolioState::new(store, blobs, blob);
    Ok(FolioApp::new(state, config))
}
