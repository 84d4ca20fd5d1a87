//! folio-core: records, errors, config and the Data Store seam shared by
//! every folio crate.

pub mod config;
pub mod errors;
pub mod memory;
pub mod model;
pub mod store;

pub use config::{FolioConfig, FolioConfigSnapshot, ENV_PREFIX};
pub use errors::{ErrorKind, FolioError, FolioResult};
pub use memory::MemoryDataStore;
pub use model::{
    Category, NewProject, NewProjectImage, Project, ProjectDetail, ProjectImage, ProjectPatch,
    PROJECTS, PROJECT_IMAGES,
};
pub use store::{from_row, from_rows, to_row, DataStore, Filter, OrderBy, Query, Row};
