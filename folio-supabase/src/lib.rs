//! folio-supabase: the hosted backend behind folio's two storage seams.
//!
//! - [`PostgrestStore`] implements `folio_core::DataStore` over `/rest/v1`.
//! - [`SupabaseStorage`] implements `folio_blob::BlobStore` over `/storage/v1`.
//!
//! Both share one [`SupabaseClient`] carrying the project URL and anon key.

mod client;
mod rest;
mod storage;

pub use client::{encode_key, status_error, SupabaseClient};
pub use rest::{filter_params, select_params, PostgrestStore};
pub use storage::SupabaseStorage;
