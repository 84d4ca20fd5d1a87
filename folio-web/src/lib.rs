//! folio-web: the HTTP surface of folio.
//!
//! Admin routes manage projects and their image galleries; public routes
//! serve category listings and detail pages. Every error leaves as a
//! Feathers-style JSON body.

pub mod app;
mod error;
pub mod rest;
mod state;
pub mod uploads;

pub use app::{blob_config, build, FolioApp};
pub use error::FolioAxumError;
pub use state::FolioState;
