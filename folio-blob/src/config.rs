/// Where project images land in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobConfig {
    /// Bucket holding every project image
    pub bucket: String,

    /// Folder inside the bucket; keys are `<prefix>/<file>`
    pub prefix: String,

    /// Largest single file accepted at the upload edge
    pub max_file_bytes: u64,

    /// Largest upload request, all files and captions together
    pub max_total_bytes: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            bucket: "project-images".to_string(),
            prefix: "project-images".to_string(),
            max_file_bytes: 25 * 1024 * 1024,   // 25MB
            max_total_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn with_max_file_mb(mut self, mb: u64) -> Self {
        self.max_file_bytes = mb * 1024 * 1024;
        self
    }

    pub fn with_max_total_mb(mut self, mb: u64) -> Self {
        self.max_total_bytes = mb * 1024 * 1024;
        self
    }
}
