//! `multipart/form-data` intake for image batches.
//!
//! Parts named `file` (or `files`) are queued in the order they arrive.
//! Parts named `caption` (or `captions`) are text; the k-th caption belongs
//! to the k-th file. Anything else is ignored.
//!
//! A file over the per-file cap is rejected with 413 while it streams in;
//! the route's body limit bounds the request as a whole.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use folio_core::FolioError;
use folio_portfolio::{ImageBatchUploader, PendingUpload};
use tracing::debug;

#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<PendingUpload>,
    pub captions: Vec<String>,
}

impl UploadForm {
    /// Queue every file, then apply captions by index.
    ///
    /// A caption with no matching file is a bounds error from the uploader.
    pub fn queue_into(self, uploader: &mut ImageBatchUploader) -> Result<(), folio_portfolio::PortfolioError> {
        for file in self.files {
            uploader.queue(file);
        }
        for (index, caption) in self.captions.into_iter().enumerate() {
            uploader.set_caption(index, caption)?;
        }
        Ok(())
    }
}

fn multipart_error(err: MultipartError) -> FolioError {
    let message = format!("Failed to parse multipart data: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return FolioError::payload_too_large(message);
    }
    FolioError::bad_request(message)
}

/// Read one file part, giving up as soon as it grows past `max_bytes`.
async fn read_file(mut field: Field<'_>, file_name: &str, max_bytes: u64) -> Result<Bytes, FolioError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (buf.len() + chunk.len()) as u64 > max_bytes {
            return Err(FolioError::payload_too_large(format!(
                "File '{file_name}' exceeds maximum size of {max_bytes} bytes"
            ))
            .with_data(serde_json::json!({ "file": file_name, "maxBytes": max_bytes })));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Collect the form; each file may be at most `max_file_bytes`.
pub async fn read_upload_form(mut multipart: Multipart, max_file_bytes: u64) -> Result<UploadForm, FolioError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("unknown").to_string();

        match name.as_str() {
            "file" | "files" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("upload-{}", form.files.len()));
                let content_type = field.content_type().map(str::to_string);
                let bytes = read_file(field, &file_name, max_file_bytes).await?;
                debug!("File field '{}': {} bytes", file_name, bytes.len());

                let mut upload = PendingUpload::new(file_name, bytes);
                upload.content_type = content_type;
                form.files.push(upload);
            }
            "caption" | "captions" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.captions.push(value);
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    if form.files.is_empty() {
        return Err(FolioError::bad_request("No files in upload")
            .with_errors(serde_json::json!({ "file": ["at least one file is required"] })));
    }
    Ok(form)
}
