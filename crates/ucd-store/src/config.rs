//! Store configuration
//!
//! Loaded from TOML or JSON, detected by file extension:
//!
//! ```toml
//! base_path = "ucd"
//! versions = ["15.1.0", "latest"]
//! concurrency = 8
//!
//! [filters]
//! exclude = ["**/*.zip", "emoji/**"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use ucd_fs::{FilterConfig, GlobLimits, PathFilter};

use crate::{Error, Result};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://unicode.org/Public";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store directory, relative to the bridge root
    pub base_path: String,
    /// Versions to manage. May contain aliases such as `latest`.
    pub versions: Vec<String>,
    /// Default parallelism for mirror, clean and repair
    pub concurrency: usize,
    pub filters: FilterConfig,
    pub glob_limits: GlobLimits,
    pub remote_base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            versions: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            filters: FilterConfig::default(),
            glob_limits: GlobLimits::default(),
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Load a configuration file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "toml" => parse(path, "TOML", || toml::from_str(&content)),
            "json" => parse(path, "JSON", || serde_json::from_str(&content)),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    /// Compile the configured filters under the configured limits.
    pub fn path_filter(&self) -> Result<PathFilter> {
        Ok(PathFilter::new(&self.filters, &self.glob_limits)?)
    }
}

fn parse<T, E, F>(path: &Path, format: &str, f: F) -> Result<T>
where
    T: DeserializeOwned,
    E: std::fmt::Display,
    F: FnOnce() -> std::result::Result<T, E>,
{
    f().map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        format: format.to_string(),
        message: e.to_string(),
    })
}
