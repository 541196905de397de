//! Read-only HTTP backend
//!
//! Maps resolved paths onto `<base_url><path>`. Directory listings are
//! expected as a JSON array of `{ "type": "file" | "directory", "name": ... }`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::bridge::{Backend, Capabilities, FileEntry};
use crate::{Error, Result};

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for [`HttpBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    #[serde(rename = "type")]
    kind: String,
    name: String,
}

/// Backend serving files over HTTP. Supports `read`, `exists` and `listdir`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self> {
        let invalid = |message: String| Error::InvalidBaseUrl {
            url: config.base_url.clone(),
            message,
        };
        let base_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::request(&config.base_url, e))?;
        Ok(Self { base_url, client })
    }

    /// Append the segments of a resolved path to the base URL, percent-encoding
    /// each one so names containing `#` or `?` stay part of the path.
    fn url(&self, path: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.into()
    }

    fn list_tree<'a>(
        &'a self,
        dir: String,
        rel: String,
        recursive: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FileEntry>>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url(&dir);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| Error::request(&url, e))?;
            let response = check_status(&url, &dir, response)?;
            let remote: Vec<RemoteEntry> = response.json().await.map_err(|e| Error::InvalidListing {
                url: url.clone(),
                message: e.to_string(),
            })?;

            let mut entries = Vec::with_capacity(remote.len());
            for item in remote {
                let path = if rel.is_empty() {
                    item.name.clone()
                } else {
                    format!("{rel}/{}", item.name)
                };
                match item.kind.as_str() {
                    "directory" => {
                        let children = if recursive {
                            let child_dir = format!("{}/{}", dir.trim_end_matches('/'), item.name);
                            self.list_tree(child_dir, path.clone(), true).await?
                        } else {
                            Vec::new()
                        };
                        entries.push(FileEntry::directory(item.name, path, children));
                    }
                    "file" => entries.push(FileEntry::file(item.name, path)),
                    other => {
                        return Err(Error::InvalidListing {
                            url,
                            message: format!("unknown entry type {other:?}"),
                        });
                    }
                }
            }
            Ok(entries)
        })
    }
}

fn check_status(url: &str, path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            path: path.to_string(),
        });
    }
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn root(&self) -> &str {
        "/"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            listdir: true,
            ..Capabilities::read_only()
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::request(&url, e))?;
        let response = check_status(&url, path, response)?;
        let bytes = response.bytes().await.map_err(|e| Error::request(&url, e))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let url = self.url(path);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| Error::request(&url, e))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::HttpStatus {
                url,
                status: status.as_u16(),
            }),
        }
    }

    async fn listdir(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        self.list_tree(path.to_string(), String::new(), recursive)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Capability, FileSystemBridge};

    #[test]
    fn url_joins_base_and_resolved_path() {
        let backend = HttpBackend::new(&HttpBackendConfig::new("https://example.com/files/")).unwrap();
        assert_eq!(
            backend.url("/16.0.0/UnicodeData.txt"),
            "https://example.com/files/16.0.0/UnicodeData.txt"
        );
    }

    #[test]
    fn url_encodes_reserved_characters_per_segment() {
        let backend = HttpBackend::new(&HttpBackendConfig::new("https://example.com")).unwrap();
        assert_eq!(
            backend.url("/16.0.0/a#b?c.txt"),
            "https://example.com/16.0.0/a%23b%3Fc.txt"
        );
        assert_eq!(backend.url("/"), "https://example.com/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpBackend::new(&HttpBackendConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl { .. }));

        let err = HttpBackend::new(&HttpBackendConfig::new("mailto:ucd@example.com")).unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn write_is_rejected_before_any_request() {
        let backend = HttpBackend::new(&HttpBackendConfig::new("http://127.0.0.1:9")).unwrap();
        let bridge = FileSystemBridge::new(backend);
        assert!(!bridge.supports(Capability::Write));
        assert!(bridge.supports(Capability::Listdir));

        let err = bridge.write("a.txt", "x").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOperation {
                capability: Capability::Write,
                backend: "http"
            }
        ));
    }

    #[test]
    fn config_defaults_timeout() {
        let config: HttpBackendConfig =
            serde_json::from_str(r#"{ "base_url": "https://example.com" }"#).unwrap();
        assert_eq!(config.timeout_secs, 30);
    }
}
