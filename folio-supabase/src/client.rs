use reqwest::{Client, RequestBuilder, StatusCode};

use folio_core::{FolioConfigSnapshot, FolioError, FolioResult};

/// Connection to one hosted project: base URL plus the anon key.
///
/// Cheap to clone; the inner `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    url: String,
    key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    /// Reads `supabase.url` and `supabase.key`.
    pub fn from_config(config: &FolioConfigSnapshot) -> FolioResult<Self> {
        Ok(Self::new(
            config.require("supabase.url")?,
            config.require("supabase.key")?,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, bucket, encode_key(key))
    }

    pub fn public_object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url,
            bucket,
            encode_key(key)
        )
    }

    /// Attach the `apikey` and bearer headers every endpoint expects.
    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
}

/// Percent-encode each path segment of an object key, keeping the slashes.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Map a non-2xx answer from the data API onto the error kinds callers see.
pub fn status_error(status: StatusCode, context: &str, body: &str) -> FolioError {
    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("{context}: HTTP {}", status.as_u16())
    } else {
        format!("{context}: HTTP {} {detail}", status.as_u16())
    };

    match status {
        StatusCode::NOT_FOUND => FolioError::not_found(message),
        StatusCode::CONFLICT => FolioError::conflict(message),
        _ => FolioError::bad_gateway(message),
    }
}
