use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use ucd_fs::{Capability, assert_capability};

use super::{Outcome, UcdStore};
use crate::layout::{ancestors, confine};
use crate::{Error, Result};
use crate::manifest::ExpectedFile;
use crate::report::{FailedFile, FileOperation, MirrorReport};
use crate::snapshot::{Snapshot, SnapshotEntry, write_snapshot};

/// Options for [`UcdStore::mirror`].
#[derive(Debug, Clone, Default)]
pub struct MirrorOptions {
    /// Versions to mirror; all managed versions when empty
    pub versions: Vec<String>,
    /// Files processed in parallel; the store default when `None`
    pub concurrency: Option<usize>,
    /// Categorize without downloading or writing anything
    pub dry_run: bool,
    /// Re-download files that already exist
    pub force: bool,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct MirrorRun {
    pub concurrency: usize,
    pub dry_run: bool,
    pub force: bool,
}

impl UcdStore {
    /// Download expected files into the store.
    ///
    /// Per-file failures are collected in the report without stopping the
    /// batch. After a successful, non-dry run the version's snapshot is
    /// rewritten in full.
    pub async fn mirror(&self, options: &MirrorOptions) -> Result<Vec<MirrorReport>> {
        let concurrency = self.concurrency(options.concurrency)?;
        let versions = self.select_versions(&options.versions)?;
        assert_capability(&self.bridge, &[Capability::Write, Capability::Mkdir])?;

        let run = MirrorRun {
            concurrency,
            dry_run: options.dry_run,
            force: options.force,
        };

        // Every manifest is resolved before any file is written, so an error
        // here leaves the store untouched
        let mut plans = Vec::with_capacity(versions.len());
        for version in &versions {
            plans.push((version, self.expected_files(version).await?));
        }

        let mut reports = Vec::with_capacity(plans.len());
        for (version, expected) in plans {
            let (report, entries) = self.mirror_files(version, &expected, run).await;

            if !run.dry_run && report.is_success() {
                self.record_snapshot(version, &expected, entries).await;
            }

            tracing::info!(
                version = %version,
                mirrored = report.mirrored.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                dry_run = run.dry_run,
                "Mirrored version"
            );
            reports.push(report);
        }
        Ok(reports)
    }

    /// Mirror `files` of one version under bounded concurrency.
    ///
    /// Returns the report and the snapshot entries of every file written.
    pub(super) async fn mirror_files(
        &self,
        version: &str,
        files: &[ExpectedFile],
        run: MirrorRun,
    ) -> (MirrorReport, BTreeMap<String, SnapshotEntry>) {
        let remote_version = self.remote_version(version);

        let outcomes: Vec<(String, Outcome)> = stream::iter(files)
            .map(|file| self.mirror_file(version, remote_version, file, run))
            .buffer_unordered(run.concurrency)
            .collect()
            .await;

        let mut report = MirrorReport::new(version);
        let mut entries = BTreeMap::new();
        for (path, outcome) in outcomes {
            match outcome {
                Outcome::Done(entry) => {
                    if let Some(entry) = entry {
                        entries.insert(path.clone(), entry);
                    }
                    report.mirrored.push(path);
                }
                Outcome::Skipped => report.skipped.push(path),
                Outcome::Failed(operation, error) => {
                    report.failed.push(FailedFile::new(path, operation, error));
                }
            }
        }
        report.sort();
        (report, entries)
    }

    async fn mirror_file(
        &self,
        version: &str,
        remote_version: &str,
        file: &ExpectedFile,
        run: MirrorRun,
    ) -> (String, Outcome) {
        let relative = file.local_path(version);
        let confined = match confine(&relative) {
            Ok(path) => path,
            Err(e) => return (relative, Outcome::Failed(FileOperation::Download, e.to_string())),
        };
        let target = self.file_location(version, &confined);

        if !run.force {
            match self.bridge.exists(&target).await {
                Ok(true) => {
                    tracing::debug!(version, file = %relative, "Already present, skipping");
                    return (relative, Outcome::Skipped);
                }
                Ok(false) => {}
                Err(e) => return (relative, Outcome::Failed(FileOperation::Exists, e.to_string())),
            }
        }

        if run.dry_run {
            tracing::debug!(version, file = %relative, "[dry-run] Would mirror");
            return (relative, Outcome::Done(None));
        }

        let content = match self
            .content_source
            .fetch_file_content(remote_version, &file.path)
            .await
        {
            Ok(content) => content,
            Err(e) => return (relative, Outcome::Failed(FileOperation::Download, e.to_string())),
        };

        if let Err(e) = self.ensure_parent(version, &confined).await {
            return (relative, Outcome::Failed(FileOperation::Mkdir, e.to_string()));
        }

        if let Err(e) = self.bridge.write(&target, &content.bytes).await {
            return (relative, Outcome::Failed(FileOperation::Write, e.to_string()));
        }

        tracing::debug!(version, file = %relative, bytes = content.bytes.len(), "Mirrored file");
        let entry = SnapshotEntry::from_content(&content.bytes);
        (relative, Outcome::Done(Some(entry)))
    }

    async fn ensure_parent(&self, version: &str, relative: &str) -> ucd_fs::Result<()> {
        let parent = match ancestors(relative).next() {
            Some(dir) => self.file_location(version, dir),
            None => self.version_dir(version),
        };
        if !self.bridge.exists(&parent).await? {
            self.bridge.mkdir(&parent).await?;
        }
        Ok(())
    }

    /// Write the snapshot covering every expected file of `version`.
    ///
    /// Files not written in this run are read back from the store. Failures
    /// are logged and leave the previous snapshot in place.
    pub(super) async fn record_snapshot(
        &self,
        version: &str,
        expected: &[ExpectedFile],
        mut entries: BTreeMap<String, SnapshotEntry>,
    ) {
        for file in expected {
            let relative = file.local_path(version);
            if entries.contains_key(&relative) {
                continue;
            }
            let content = match confine(&relative) {
                Ok(confined) => self
                    .bridge
                    .read(&self.file_location(version, &confined))
                    .await
                    .map_err(Error::from),
                Err(e) => Err(e),
            };
            match content {
                Ok(content) => {
                    entries.insert(relative, SnapshotEntry::from_content(&content));
                }
                Err(e) => {
                    tracing::warn!(version, file = %relative, error = %e, "Snapshot not written");
                    return;
                }
            }
        }

        let snapshot = Snapshot {
            unicode_version: version.to_string(),
            files: entries,
        };
        if let Err(e) = write_snapshot(&self.bridge, &self.base_path, version, &snapshot).await {
            tracing::warn!(version, error = %e, "Failed to write snapshot");
        }
    }
}
