use folio_blob::BlobError;
use folio_core::FolioError;
use serde_json::json;
use thiserror::Error;

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[derive(Error, Debug)]
pub enum PortfolioError {
    /// Data Store call failed.
    #[error(transparent)]
    Store(#[from] FolioError),

    #[error("Object storage failed: {0}")]
    Blob(#[from] BlobError),

    #[error("Caption index {index} out of range for {len} pending file(s)")]
    CaptionIndex { index: usize, len: usize },

    /// A batch stopped part way; files before `failed_at` are persisted.
    #[error("Upload stopped at file {failed_at} after saving {persisted} image(s): {source}")]
    BatchFailed {
        persisted: usize,
        failed_at: usize,
        source: Box<PortfolioError>,
    },

    #[error("{0}")]
    NotFound(String),
}

impl PortfolioError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<PortfolioError> for FolioError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::Store(e) => e,
            PortfolioError::Blob(e) => {
                let message = e.to_string();
                if e.is_unavailable() {
                    FolioError::unavailable(message).with_source(e)
                } else {
                    FolioError::bad_gateway(message).with_source(e)
                }
            }
            PortfolioError::CaptionIndex { index, len } => FolioError::bad_request(format!(
                "Caption index {index} out of range for {len} pending file(s)"
            ))
            .with_data(json!({ "index": index, "len": len })),
            PortfolioError::BatchFailed {
                persisted,
                failed_at,
                source,
            } => {
                let message = format!(
                    "Upload stopped at file {failed_at} after saving {persisted} image(s): {source}"
                );
                FolioError::bad_gateway(message)
                    .with_data(json!({ "persisted": persisted, "failedAt": failed_at }))
                    .with_source(*source)
            }
            PortfolioError::NotFound(message) => FolioError::not_found(message),
        }
    }
}
