//! # folio configuration
//!
//! A flat string key/value store, set programmatically or layered from the
//! environment:
//!
//! ```rust
//! use folio_core::FolioConfig;
//!
//! let mut config = FolioConfig::new();
//! config.set("http.port", "8080");
//! config.set("storage.bucket", "project-images");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_u16("http.port"), Some(8080));
//! ```
//!
//! ## Environment overrides
//! [`FolioConfig::load_env`] maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export FOLIO__HTTP__PORT=8080        # http.port
//! export FOLIO__STORAGE__BACKEND=s3    # storage.backend
//! ```

use std::collections::HashMap;

use crate::errors::{FolioError, FolioResult};

pub const ENV_PREFIX: &str = "FOLIO__";

#[derive(Debug, Default, Clone)]
pub struct FolioConfig {
    values: HashMap<String, String>,
}

impl FolioConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Config seeded with the defaults every deployment starts from.
    pub fn with_defaults() -> Self {
        let mut config = Self::new();
        config.set("http.host", "127.0.0.1");
        config.set("http.port", "3030");
        config.set("backend", "memory");
        config.set("storage.backend", "memory");
        config.set("storage.bucket", "project-images");
        config.set("storage.prefix", "project-images");
        config.set("upload.max_file_mb", "25");
        config.set("upload.max_total_mb", "100");
        config
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply every `<prefix>A__B=value` variable as `a.b = value`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`load_env`](Self::load_env) over an explicit variable list.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    /// Hosted-backend credentials under the names the web client used.
    pub fn load_supabase_env(&mut self) {
        for (var, key) in [
            ("SUPABASE_URL", "supabase.url"),
            ("SUPABASE_ANON_KEY", "supabase.key"),
        ] {
            if let Ok(value) = std::env::var(var) {
                if !self.has(key) {
                    self.set(key, value);
                }
            }
        }
    }

    pub fn snapshot(&self) -> FolioConfigSnapshot {
        FolioConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only view handed to components at startup.
#[derive(Debug, Clone, Default)]
pub struct FolioConfigSnapshot {
    map: HashMap<String, String>,
}

impl FolioConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u16(&self, key: &str) -> Option<u16> {
        self.get(key).and_then(|v| v.parse::<u16>().ok())
    }

    /// A key the selected backend cannot start without.
    pub fn require(&self, key: &str) -> FolioResult<String> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| FolioError::bad_request(format!("Missing configuration key: {key}")))
    }
}
