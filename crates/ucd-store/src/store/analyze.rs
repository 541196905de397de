use std::collections::BTreeSet;

use ucd_fs::{Capability, FileEntry, assert_capability};

use super::UcdStore;
use crate::Result;
use crate::manifest::ExpectedFile;
use crate::report::VersionAnalysis;
use crate::snapshot::SNAPSHOT_FILE;

/// Drift of one version plus the filtered manifest it was computed from.
pub(super) struct Drift {
    pub analysis: VersionAnalysis,
    pub expected: Vec<ExpectedFile>,
}

impl UcdStore {
    /// Compare the files on disk against the expected manifest.
    ///
    /// Analyzes every managed version when `versions` is empty. The store's
    /// path filter applies to both sides, and `snapshot.json` is never
    /// reported as an orphan.
    pub async fn analyze(&self, versions: &[String]) -> Result<Vec<VersionAnalysis>> {
        let versions = self.select_versions(versions)?;
        assert_capability(&self.bridge, &[Capability::Listdir])?;

        let mut analyses = Vec::with_capacity(versions.len());
        for version in &versions {
            let analysis = self.drift(version).await?.analysis;
            tracing::info!(
                version = %analysis.version,
                files = analysis.file_count,
                missing = analysis.missing_files.len(),
                orphaned = analysis.orphaned_files.len(),
                complete = analysis.is_complete,
                "Analyzed version"
            );
            analyses.push(analysis);
        }
        Ok(analyses)
    }

    pub(super) async fn drift(&self, version: &str) -> Result<Drift> {
        let expected = self.expected_files(version).await?;
        let files = self.local_files(version).await?;

        let expected_paths: BTreeSet<String> =
            expected.iter().map(|f| f.local_path(version)).collect();
        let on_disk: BTreeSet<&str> = files.iter().map(String::as_str).collect();

        let missing_files: Vec<String> = expected_paths
            .iter()
            .filter(|p| !on_disk.contains(p.as_str()))
            .cloned()
            .collect();
        let orphaned_files: Vec<String> = files
            .iter()
            .filter(|p| !expected_paths.contains(*p))
            .cloned()
            .collect();

        let analysis = VersionAnalysis {
            version: version.to_string(),
            file_count: files.len(),
            expected_file_count: expected_paths.len(),
            is_complete: missing_files.is_empty() && orphaned_files.is_empty(),
            files,
            missing_files,
            orphaned_files,
        };
        Ok(Drift { analysis, expected })
    }

    /// The manifest for `version`, narrowed by the store filter.
    pub(super) async fn expected_files(&self, version: &str) -> Result<Vec<ExpectedFile>> {
        let files = self.manifest_source.expected_files(version).await?;
        Ok(files
            .into_iter()
            .filter(|f| self.filter.matches(&f.local_path(version)))
            .collect())
    }

    /// Sorted version-relative paths of the files on disk.
    async fn local_files(&self, version: &str) -> Result<Vec<String>> {
        let dir = self.version_dir(version);
        if !self.bridge.exists(&dir).await? {
            return Ok(Vec::new());
        }

        let tree = self.bridge.listdir(&dir, true).await?;
        let mut files: Vec<String> = FileEntry::flatten(&tree)
            .into_iter()
            .filter(|p| p != SNAPSHOT_FILE && self.filter.matches(p))
            .collect();
        files.sort();
        Ok(files)
    }
}
