//! External collaborators of the store
//!
//! The store never decides on its own which files a version contains, where
//! their bytes come from, or which versions exist. Those answers come from
//! the three traits in this module.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use reqwest::header::CONTENT_TYPE;

use crate::config::StoreConfig;
use crate::manifest::ExpectedFile;
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists the files a version is expected to contain.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn expected_files(&self, version: &str) -> Result<Vec<ExpectedFile>>;
}

/// Remote file content together with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            bytes: text.into().into_bytes(),
            content_type: Some("text/plain; charset=utf-8".to_string()),
        }
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some("application/octet-stream".to_string()),
        }
    }

    pub fn is_text(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/") || ct.contains("json"))
    }
}

/// Fetches file content for a version.
///
/// `version` is the remote (mapped) version name and `path` the file's
/// logical path.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_file_content(&self, version: &str, path: &str) -> Result<FetchedContent>;
}

/// Enumerates the Unicode versions that exist.
#[async_trait]
pub trait VersionRegistry: Send + Sync {
    async fn list_versions(&self) -> Result<Vec<String>>;
}

/// Fixed per-version manifests.
#[derive(Debug, Clone, Default)]
pub struct StaticManifestSource {
    manifests: BTreeMap<String, Vec<ExpectedFile>>,
}

impl StaticManifestSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl Into<String>, files: Vec<ExpectedFile>) -> Self {
        self.manifests.insert(version.into(), files);
        self
    }

    /// Shorthand for a manifest whose files are stored at their logical path.
    pub fn with_paths<I, S>(self, version: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = paths.into_iter().map(ExpectedFile::new).collect();
        self.with_version(version, files)
    }
}

#[async_trait]
impl ManifestSource for StaticManifestSource {
    async fn expected_files(&self, version: &str) -> Result<Vec<ExpectedFile>> {
        self.manifests
            .get(version)
            .cloned()
            .ok_or_else(|| Error::Manifest {
                version: version.to_string(),
                message: "no manifest registered".to_string(),
            })
    }
}

/// In-memory file contents keyed by version and path.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    files: BTreeMap<(String, String), FetchedContent>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(
        mut self,
        version: impl Into<String>,
        path: impl Into<String>,
        content: FetchedContent,
    ) -> Self {
        self.insert(version, path, content);
        self
    }

    pub fn insert(
        &mut self,
        version: impl Into<String>,
        path: impl Into<String>,
        content: FetchedContent,
    ) {
        let path = path.into().trim_start_matches('/').to_string();
        self.files.insert((version.into(), path), content);
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn fetch_file_content(&self, version: &str, path: &str) -> Result<FetchedContent> {
        let key = (version.to_string(), path.trim_start_matches('/').to_string());
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::remote(format!("memory://{version}/{}", key.1), "not found"))
    }
}

/// Fetches `GET <base_url>/<version>/<path>`.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    base_url: Url,
    client: Client,
}

impl HttpContentSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(base_url).map_err(|e| Error::remote(base_url, e))?;
        if url.cannot_be_a_base() {
            return Err(Error::remote(base_url, "URL cannot carry a path"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::remote(base_url, e))?;
        Ok(Self {
            base_url: url,
            client,
        })
    }

    /// Source for the configured `remote_base_url`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(&config.remote_base_url, DEFAULT_TIMEOUT)
    }

    /// `<base_url>/<version>/<path>` with every segment percent-encoded.
    pub fn url(&self, version: &str, path: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(
                version
                    .split('/')
                    .chain(path.split('/'))
                    .filter(|s| !s.is_empty()),
            );
        }
        url.into()
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_file_content(&self, version: &str, path: &str) -> Result<FetchedContent> {
        let url = self.url(version, path);
        tracing::debug!(%url, "Fetching remote file");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::remote(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote(&url, format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| Error::remote(&url, e))?;

        Ok(FetchedContent {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// A fixed list of known versions.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionRegistry {
    versions: Vec<String>,
}

impl StaticVersionRegistry {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl VersionRegistry for StaticVersionRegistry {
    async fn list_versions(&self) -> Result<Vec<String>> {
        Ok(self.versions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_manifest_rejects_unknown_versions() {
        let source = StaticManifestSource::new().with_paths("16.0.0", ["A.txt", "nested/C.txt"]);

        let files = source.expected_files("16.0.0").await.unwrap();
        assert_eq!(files[1].name, "C.txt");
        assert!(matches!(
            source.expected_files("1.0.0").await,
            Err(Error::Manifest { .. })
        ));
    }

    #[tokio::test]
    async fn memory_content_ignores_leading_slash() {
        let source =
            MemoryContentSource::new().with_file("16.0.0", "/A.txt", FetchedContent::text("a"));
        let content = source.fetch_file_content("16.0.0", "A.txt").await.unwrap();
        assert_eq!(content.bytes, b"a");
        assert!(content.is_text());
        assert!(source.fetch_file_content("15.1.0", "A.txt").await.is_err());
    }

    #[test]
    fn http_source_follows_config() {
        let config = StoreConfig {
            remote_base_url: "http://localhost:8080/ucd".to_string(),
            ..StoreConfig::default()
        };
        let source = HttpContentSource::from_config(&config).unwrap();
        assert_eq!(source.url("16.0.0", "A.txt"), "http://localhost:8080/ucd/16.0.0/A.txt");
    }

    #[test]
    fn http_urls_join_cleanly() {
        let source =
            HttpContentSource::new("https://unicode.org/Public/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            source.url("16.0.0", "/ucd/UnicodeData.txt"),
            "https://unicode.org/Public/16.0.0/ucd/UnicodeData.txt"
        );
    }

    #[test]
    fn http_urls_keep_reserved_characters_in_the_path() {
        let source = HttpContentSource::new("https://unicode.org/Public", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            source.url("16.0.0", "notes#1?.txt"),
            "https://unicode.org/Public/16.0.0/notes%231%3F.txt"
        );
        assert!(HttpContentSource::new("not a url", DEFAULT_TIMEOUT).is_err());
    }
}
