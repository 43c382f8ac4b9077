//! Runtime configuration read from the environment
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Listen address (`ESCAPE_ADDR`)
    pub addr: String,
    /// YAML room catalog (`ESCAPE_CATALOG`)
    pub catalog_path: Option<PathBuf>,
    /// Retries after a write conflict before giving up (`ESCAPE_MAX_WRITE_RETRIES`)
    pub max_write_retries: u32,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or unparseable values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_write_retries = match non_empty("ESCAPE_MAX_WRITE_RETRIES") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid ESCAPE_MAX_WRITE_RETRIES; using default");
                DEFAULT_MAX_WRITE_RETRIES
            }),
            None => DEFAULT_MAX_WRITE_RETRIES,
        };

        Self {
            addr: non_empty("ESCAPE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            catalog_path: non_empty("ESCAPE_CATALOG").map(PathBuf::from),
            max_write_retries,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
