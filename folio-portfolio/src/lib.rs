//! folio-portfolio: project images and the project catalogue.
//!
//! - [`ImageBatchUploader`] turns queued files into stored objects and
//!   `project_images` rows, appending after the existing images.
//! - [`ImageCollectionManager`] keeps one project's images in display order
//!   and applies removals and reorders through the store.
//! - [`ProjectCatalog`] is the CRUD and page-lookup layer over `projects`.

pub mod catalogue;
pub mod collection;
pub mod error;
pub mod uploader;

pub use catalogue::ProjectCatalog;
pub use collection::ImageCollectionManager;
pub use error::{PortfolioError, PortfolioResult};
pub use uploader::{ImageBatchUploader, PendingUpload};
