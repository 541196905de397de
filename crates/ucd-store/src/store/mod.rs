//! The UCD store and its reconciliation engine
//!
//! [`UcdStore`] keeps a local copy of one or more Unicode releases in sync
//! with an expected manifest:
//!
//! - **analyze**: diff the files on disk against the manifest
//! - **mirror**: download missing (or all) expected files
//! - **clean**: delete files the manifest does not list
//! - **repair**: restore missing files and delete orphans in one pass
//!
//! Drift is recomputed on every call; the store caches nothing about the
//! filesystem between calls.

mod analyze;
mod clean;
mod mirror;
mod read;
mod repair;

use std::sync::Arc;

use ucd_fs::{FileSystemBridge, FilterConfig, PathFilter};

use crate::config::StoreConfig;
use crate::layout::join;
use crate::manifest::StoreManifest;
use crate::report::FileOperation;
use crate::snapshot::SnapshotEntry;
use crate::source::{ContentSource, ManifestSource, VersionRegistry};
use crate::version::resolve_versions;
use crate::{Error, Result};

pub use clean::CleanOptions;
pub use mirror::MirrorOptions;
pub use repair::RepairOptions;

/// Outcome of one file in a batch.
#[derive(Debug)]
enum Outcome {
    /// Mirrored or deleted; carries the snapshot entry of written content
    Done(Option<SnapshotEntry>),
    Skipped,
    Failed(FileOperation, String),
}

/// Builder for [`UcdStore`].
pub struct StoreBuilder {
    bridge: FileSystemBridge,
    manifest_source: Arc<dyn ManifestSource>,
    content_source: Arc<dyn ContentSource>,
    registry: Option<Arc<dyn VersionRegistry>>,
    config: StoreConfig,
}

impl StoreBuilder {
    /// Take base path, versions, concurrency and filters from `config`.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    pub fn versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn filters(mut self, filters: FilterConfig) -> Self {
        self.config.filters = filters;
        self
    }

    pub fn version_registry(mut self, registry: impl VersionRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Validate the configuration and build the store.
    ///
    /// The store still needs [`UcdStore::init`] before use.
    pub fn build(self) -> Result<UcdStore> {
        check_concurrency(self.config.concurrency)?;
        let filter = self.config.path_filter()?;

        Ok(UcdStore {
            bridge: self.bridge,
            base_path: self.config.base_path.trim_matches('/').to_string(),
            manifest_source: self.manifest_source,
            content_source: self.content_source,
            registry: self.registry,
            filter,
            requested_versions: self.config.versions,
            concurrency: self.config.concurrency,
            manifest: None,
        })
    }
}

/// A local UCD store on top of a [`FileSystemBridge`].
pub struct UcdStore {
    bridge: FileSystemBridge,
    base_path: String,
    manifest_source: Arc<dyn ManifestSource>,
    content_source: Arc<dyn ContentSource>,
    registry: Option<Arc<dyn VersionRegistry>>,
    filter: PathFilter,
    requested_versions: Vec<String>,
    concurrency: usize,
    manifest: Option<StoreManifest>,
}

impl std::fmt::Debug for UcdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UcdStore")
            .field("bridge", &self.bridge)
            .field("base_path", &self.base_path)
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

impl UcdStore {
    pub fn builder(
        bridge: FileSystemBridge,
        manifest_source: impl ManifestSource + 'static,
        content_source: impl ContentSource + 'static,
    ) -> StoreBuilder {
        StoreBuilder {
            bridge,
            manifest_source: Arc::new(manifest_source),
            content_source: Arc::new(content_source),
            registry: None,
            config: StoreConfig::default(),
        }
    }

    /// Load or create the store manifest.
    ///
    /// An existing `.ucd-store.json` is the source of truth; configured
    /// versions it does not list yet are resolved (aliases through the
    /// version registry) and added. The manifest is written back whenever it
    /// changes and the bridge supports `write`.
    pub async fn init(&mut self) -> Result<()> {
        let mut manifest = StoreManifest::load(&self.bridge, &self.base_path)
            .await?
            .unwrap_or_default();

        let pending: Vec<String> = self
            .requested_versions
            .iter()
            .filter(|v| !manifest.contains(v))
            .cloned()
            .collect();

        let mut changed = false;
        if !pending.is_empty() {
            let resolved = resolve_versions(self.registry.as_deref(), &pending).await?;
            for version in resolved {
                if !manifest.contains(&version) {
                    changed |= manifest.insert(version.clone(), version);
                }
            }
        }

        if changed {
            manifest.save(&self.bridge, &self.base_path).await?;
        }

        tracing::info!(
            base_path = %self.base_path,
            versions = manifest.len(),
            "Store initialized"
        );
        self.manifest = Some(manifest);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.manifest.is_some()
    }

    pub fn manifest(&self) -> Result<&StoreManifest> {
        self.manifest.as_ref().ok_or(Error::NotInitialized)
    }

    /// Managed versions in ascending order.
    pub fn versions(&self) -> Result<Vec<String>> {
        Ok(self.manifest()?.versions().map(str::to_string).collect())
    }

    pub fn bridge(&self) -> &FileSystemBridge {
        &self.bridge
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Requested versions, or every managed version when none are given.
    fn select_versions(&self, requested: &[String]) -> Result<Vec<String>> {
        let manifest = self.manifest()?;
        if requested.is_empty() {
            return Ok(manifest.versions().map(str::to_string).collect());
        }
        requested
            .iter()
            .map(|v| {
                if manifest.contains(v) {
                    Ok(v.clone())
                } else {
                    Err(Error::VersionNotManaged { version: v.clone() })
                }
            })
            .collect()
    }

    fn ensure_managed(&self, version: &str) -> Result<()> {
        if self.manifest()?.contains(version) {
            Ok(())
        } else {
            Err(Error::VersionNotManaged {
                version: version.to_string(),
            })
        }
    }

    fn concurrency(&self, requested: Option<usize>) -> Result<usize> {
        let value = requested.unwrap_or(self.concurrency);
        check_concurrency(value)?;
        Ok(value)
    }

    /// Version name used when fetching remote content.
    fn remote_version<'a>(&'a self, version: &'a str) -> &'a str {
        self.manifest
            .as_ref()
            .and_then(|m| m.mapped_version(version))
            .unwrap_or(version)
    }

    fn version_dir(&self, version: &str) -> String {
        join(&self.base_path, version)
    }

    fn file_location(&self, version: &str, relative: &str) -> String {
        join(&self.version_dir(version), relative)
    }
}

fn check_concurrency(value: usize) -> Result<()> {
    if value < 1 {
        return Err(Error::InvalidConcurrency { value });
    }
    Ok(())
}
