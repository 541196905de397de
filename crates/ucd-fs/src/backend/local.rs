//! Local disk backend

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::bridge::{Backend, Capabilities, FileEntry, RmOptions};
use crate::path::normalize_base;
use crate::{Error, Result};

/// Backend rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: String,
}

impl LocalBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_base(&root.as_ref().to_string_lossy()),
        }
    }
}

fn map_io(path: &str, source: std::io::Error) -> Error {
    if source.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound {
            path: path.to_string(),
        }
    } else {
        Error::io(path, source)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| map_io(path, e))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| Error::io(path, e))
    }

    /// Write-to-temp-then-rename so readers never observe a partial file.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let native = PathBuf::from(path);
        if let Some(parent) = native.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }

        let temp_name = format!(
            ".{}.{}.tmp",
            native
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = native.with_file_name(&temp_name);

        if let Err(e) = tokio::fs::write(&temp_path, data).await {
            discard_temp(&temp_path).await;
            return Err(Error::io(&temp_path, e));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &native).await {
            discard_temp(&temp_path).await;
            return Err(Error::io(&native, e));
        }
        Ok(())
    }

    async fn listdir(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let dir = PathBuf::from(path);
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || walk(&dir, "", recursive))
            .await
            .map_err(|e| Error::io(&owned, std::io::Error::other(e)))?
            .map_err(|e| map_io(&owned, e))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| Error::io(path, e))
    }

    async fn rm(&self, path: &str, options: RmOptions) -> Result<()> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && options.force => return Ok(()),
            Err(e) => return Err(map_io(path, e)),
        };

        let result = if metadata.is_dir() {
            if options.recursive {
                tokio::fs::remove_dir_all(path).await
            } else {
                tokio::fs::remove_dir(path).await
            }
        } else {
            tokio::fs::remove_file(path).await
        };
        result.map_err(|e| map_io(path, e))
    }
}

/// Remove a temp file left by a failed write; a temp that never got created
/// is not an error.
async fn discard_temp(temp_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
        }
    }
}

fn walk(dir: &Path, rel: &str, recursive: bool) -> std::io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = if rel.is_empty() {
            name.clone()
        } else {
            format!("{rel}/{name}")
        };

        if entry.file_type()?.is_dir() {
            let children = if recursive {
                walk(&entry.path(), &path, true)?
            } else {
                Vec::new()
            };
            entries.push(FileEntry::directory(name, path, children));
        } else {
            entries.push(FileEntry::file(name, path));
        }
    }
    entries.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(entries)
}
