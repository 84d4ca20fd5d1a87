//! # folio-blob: object storage for project images
//!
//! A small storage seam the image uploader writes through:
//!
//! ```text
//! ┌──────────────────────┐
//! │  ImageBatchUploader  │  ← ordering, captions, rows
//! ├──────────────────────┤
//! │  BlobKeyStrategy     │  ← where each file lands
//! ├──────────────────────┤
//! │  BlobStore           │  ← put / public_url
//! └──────────────────────┘
//! ```
//!
//! ```rust
//! use folio_blob::{BlobKeyStrategy, BlobStore, ImageKeyStrategy, MemoryBlobStore};
//!
//! # #[tokio::main]
//! # async fn main() -> folio_blob::BlobResult<()> {
//! let store = MemoryBlobStore::default();
//! let keys = ImageKeyStrategy::new("project-images");
//!
//! let key = keys.object_key(7, 0, "cover.jpg");
//! store.put("project-images", &key, Some("image/jpeg"), bytes::Bytes::from_static(b"..")).await?;
//! let url = store.public_url("project-images", &key);
//! assert!(url.ends_with(".jpg"));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod memory;
mod s3;
pub mod store;

pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory::{MemoryBlobStore, StoredObject};
pub use s3::{S3CompatibleStore, S3Config};
pub use store::{extension, BlobKeyStrategy, BlobStore, ImageKeyStrategy, PutResult};
