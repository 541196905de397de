use ucd_fs::{Capability, FileEntry, FilterConfig, PathFilter, assert_capability, resolve_safe_path};

use super::UcdStore;
use crate::snapshot::SNAPSHOT_FILE;
use crate::{Error, Result};

impl UcdStore {
    /// Tree of the files stored for `version`.
    ///
    /// Paths are relative to the version directory. The store filter applies,
    /// narrowed further by `filters` when given; directories left without
    /// matching files are dropped.
    pub async fn file_tree(
        &self,
        version: &str,
        filters: Option<&FilterConfig>,
    ) -> Result<Vec<FileEntry>> {
        self.ensure_managed(version)?;
        assert_capability(&self.bridge, &[Capability::Listdir])?;
        let filter = self.call_filter(filters)?;

        let dir = self.version_dir(version);
        if !self.bridge.exists(&dir).await? {
            return Ok(Vec::new());
        }
        let tree = self.bridge.listdir(&dir, true).await?;
        Ok(prune_tree(tree, &filter))
    }

    /// Flat, sorted list of the files stored for `version`.
    pub async fn file_paths(
        &self,
        version: &str,
        filters: Option<&FilterConfig>,
    ) -> Result<Vec<String>> {
        let tree = self.file_tree(version, filters).await?;
        let mut paths = FileEntry::flatten(&tree);
        paths.sort();
        Ok(paths)
    }

    /// Read a stored file as text.
    pub async fn file(&self, version: &str, path: &str) -> Result<String> {
        let bytes = self.file_bytes(version, path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a stored file as raw bytes.
    ///
    /// Fails with [`Error::FileExcluded`] when the store filter excludes it.
    pub async fn file_bytes(&self, version: &str, path: &str) -> Result<Vec<u8>> {
        self.ensure_managed(version)?;

        // Normalize against a virtual root so `..` cannot leave the version
        let relative = resolve_safe_path("/", path)?
            .trim_start_matches('/')
            .to_string();
        if relative.is_empty() || !self.filter.matches(&relative) {
            return Err(Error::FileExcluded {
                path: path.to_string(),
            });
        }

        Ok(self
            .bridge
            .read(&self.file_location(version, &relative))
            .await?)
    }

    fn call_filter(&self, filters: Option<&FilterConfig>) -> Result<PathFilter> {
        match filters {
            Some(extra) if !extra.is_empty() => Ok(self.filter.extend(extra)?),
            _ => Ok(self.filter.clone()),
        }
    }
}

fn prune_tree(entries: Vec<FileEntry>, filter: &PathFilter) -> Vec<FileEntry> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            FileEntry::File { .. } => {
                let keep = entry.path() != SNAPSHOT_FILE && filter.matches(entry.path());
                keep.then_some(entry)
            }
            FileEntry::Directory {
                name,
                path,
                children,
            } => {
                let children = prune_tree(children, filter);
                (!children.is_empty()).then(|| FileEntry::directory(name, path, children))
            }
        })
        .collect()
}
