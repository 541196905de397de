//! Expected-file manifests and the persisted store manifest

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ucd_fs::{Capability, FileSystemBridge};

use crate::layout::join;
use crate::{Error, Result};

/// File name of the store manifest, relative to the store base.
pub const STORE_MANIFEST_FILE: &str = ".ucd-store.json";

/// One file a version is expected to contain.
///
/// `path` is the version-relative logical path used for remote fetches.
/// `store_path` relocates the file inside the store; when empty the file is
/// stored at `<version>/<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedFile {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub store_path: String,
}

impl ExpectedFile {
    /// Build an entry whose name is the last segment of `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            name,
            path,
            store_path: String::new(),
        }
    }

    pub fn with_store_path(mut self, store_path: impl Into<String>) -> Self {
        self.store_path = store_path.into();
        self
    }

    /// Location of this file relative to the version directory.
    ///
    /// This is the key used in drift reports, operation reports and snapshots.
    pub fn local_path(&self, version: &str) -> String {
        let store_path = self.store_path.trim_start_matches('/');
        if store_path.is_empty() {
            return self.path.trim_start_matches('/').to_string();
        }
        store_path
            .strip_prefix(version)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(store_path)
            .to_string()
    }
}

/// The versions a store manages, mapped to the version name used remotely.
///
/// Persisted as `.ucd-store.json`:
///
/// ```json
/// { "15.1.0": "15.1.0", "16.0.0": "16.0.0" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreManifest {
    versions: BTreeMap<String, String>,
}

impl StoreManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version. Returns `true` when the manifest changed.
    pub fn insert(&mut self, version: impl Into<String>, mapped: impl Into<String>) -> bool {
        let mapped = mapped.into();
        let previous = self.versions.insert(version.into(), mapped.clone());
        previous.as_deref() != Some(mapped.as_str())
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    pub fn mapped_version(&self, version: &str) -> Option<&str> {
        self.versions.get(version).map(String::as_str)
    }

    /// Declared versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn path(base: &str) -> String {
        join(base, STORE_MANIFEST_FILE)
    }

    /// Load the manifest from `<base>/.ucd-store.json`, or `None` when absent.
    pub async fn load(bridge: &FileSystemBridge, base: &str) -> Result<Option<Self>> {
        let path = Self::path(base);
        if !bridge.exists(&path).await? {
            return Ok(None);
        }

        let content = bridge.read(&path).await?;
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| Error::StoreManifestInvalid {
                path,
                message: e.to_string(),
            })
    }

    /// Persist the manifest. A bridge without `write` makes this a no-op.
    pub async fn save(&self, bridge: &FileSystemBridge, base: &str) -> Result<()> {
        if !bridge.supports(Capability::Write) {
            tracing::debug!(
                backend = bridge.backend_name(),
                "Bridge is read-only, store manifest not persisted"
            );
            return Ok(());
        }

        if !base.is_empty() && bridge.supports(Capability::Mkdir) && !bridge.exists(base).await? {
            bridge.mkdir(base).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        bridge.write(&Self::path(base), content).await?;
        Ok(())
    }
}
