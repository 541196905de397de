use std::cmp::Reverse;
use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use ucd_fs::{Capability, RmOptions, assert_capability};

use super::{Outcome, UcdStore};
use crate::Result;
use crate::layout::{ancestors, confine, join};
use crate::report::{CleanReport, FailedFile, FileOperation, VersionAnalysis};

/// Options for [`UcdStore::clean`].
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Versions to clean; all managed versions when empty
    pub versions: Vec<String>,
    /// Files processed in parallel; the store default when `None`
    pub concurrency: Option<usize>,
    /// Categorize without deleting anything
    pub dry_run: bool,
    /// Remove directories left empty by the deletions
    pub directories: bool,
    /// Previously computed drift to clean from instead of analyzing again
    pub analysis: Option<Vec<VersionAnalysis>>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            versions: Vec::new(),
            concurrency: None,
            dry_run: false,
            directories: true,
            analysis: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct RemoveRun {
    pub concurrency: usize,
    pub dry_run: bool,
    /// Report files that are already gone as failures instead of skipping them
    pub strict: bool,
}

#[derive(Debug, Default)]
pub(super) struct Removal {
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

const ALREADY_ABSENT: &str = "File does not exist";

impl UcdStore {
    /// Delete orphaned files: files on disk the manifest does not list.
    pub async fn clean(&self, options: &CleanOptions) -> Result<Vec<CleanReport>> {
        let concurrency = self.concurrency(options.concurrency)?;
        let versions = self.select_versions(&options.versions)?;
        assert_capability(&self.bridge, &[Capability::Listdir, Capability::Rm])?;

        let analyses = match &options.analysis {
            Some(analyses) => analyses
                .iter()
                .filter(|a| versions.contains(&a.version))
                .cloned()
                .collect(),
            None => self.analyze(&versions).await?,
        };

        let run = RemoveRun {
            concurrency,
            dry_run: options.dry_run,
            strict: false,
        };

        let mut reports = Vec::with_capacity(analyses.len());
        for analysis in analyses {
            let version = analysis.version;
            let removal = self
                .remove_files(&version, &analysis.orphaned_files, run)
                .await;

            let removed_directories = if options.directories && !options.dry_run {
                self.prune_empty_directories(&version, &removal.removed)
                    .await
            } else {
                Vec::new()
            };

            tracing::info!(
                version = %version,
                deleted = removal.removed.len(),
                skipped = removal.skipped.len(),
                failed = removal.failed.len(),
                directories = removed_directories.len(),
                dry_run = run.dry_run,
                "Cleaned version"
            );
            reports.push(CleanReport {
                version,
                deleted: removal.removed,
                skipped: removal.skipped,
                failed: removal.failed,
                removed_directories,
            });
        }
        Ok(reports)
    }

    /// Remove version-relative `files` under bounded concurrency.
    pub(super) async fn remove_files(&self, version: &str, files: &[String], run: RemoveRun) -> Removal {
        let outcomes: Vec<(String, Outcome)> = stream::iter(files)
            .map(|file| self.remove_file(version, file, run))
            .buffer_unordered(run.concurrency)
            .collect()
            .await;

        let mut removal = Removal::default();
        for (path, outcome) in outcomes {
            match outcome {
                Outcome::Done(_) => removal.removed.push(path),
                Outcome::Skipped => removal.skipped.push(path),
                Outcome::Failed(operation, error) => {
                    removal.failed.push(FailedFile::new(path, operation, error));
                }
            }
        }
        removal.removed.sort();
        removal.skipped.sort();
        removal.failed.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        removal
    }

    async fn remove_file(&self, version: &str, relative: &str, run: RemoveRun) -> (String, Outcome) {
        let target = match confine(relative) {
            Ok(confined) => self.file_location(version, &confined),
            Err(e) => {
                return (
                    relative.to_string(),
                    Outcome::Failed(FileOperation::Remove, e.to_string()),
                );
            }
        };
        let absent = || {
            if run.strict {
                Outcome::Failed(FileOperation::Remove, ALREADY_ABSENT.to_string())
            } else {
                Outcome::Skipped
            }
        };

        let outcome = match self.bridge.exists(&target).await {
            Err(e) => Outcome::Failed(FileOperation::Exists, e.to_string()),
            Ok(false) => absent(),
            Ok(true) if run.dry_run => {
                tracing::debug!(version, file = relative, "[dry-run] Would remove");
                Outcome::Done(None)
            }
            Ok(true) => match self.bridge.rm(&target, RmOptions::default()).await {
                Ok(()) => {
                    tracing::debug!(version, file = relative, "Removed file");
                    Outcome::Done(None)
                }
                Err(e) if e.is_not_found() => absent(),
                Err(e) => Outcome::Failed(FileOperation::Remove, e.to_string()),
            },
        };
        (relative.to_string(), outcome)
    }

    /// Remove directories emptied by deleting `removed`, deepest first,
    /// ending with the version directory itself.
    ///
    /// Returns the removed directories relative to the store base.
    pub(super) async fn prune_empty_directories(&self, version: &str, removed: &[String]) -> Vec<String> {
        if removed.is_empty() {
            return Vec::new();
        }

        let confined: Vec<String> = removed.iter().filter_map(|p| confine(p).ok()).collect();
        let candidates: BTreeSet<&str> = confined.iter().flat_map(|p| ancestors(p)).collect();
        let mut ordered: Vec<&str> = candidates.into_iter().collect();
        ordered.sort_by_key(|dir| Reverse(dir.matches('/').count()));

        let mut pruned = Vec::new();
        for dir in ordered {
            if self.remove_if_empty(&self.file_location(version, dir)).await {
                pruned.push(join(version, dir));
            }
        }
        if self.remove_if_empty(&self.version_dir(version)).await {
            pruned.push(version.to_string());
        }
        pruned
    }

    async fn remove_if_empty(&self, dir: &str) -> bool {
        match self.bridge.listdir(dir, false).await {
            Ok(entries) if entries.is_empty() => {
                match self.bridge.rm(dir, RmOptions::default()).await {
                    Ok(()) => {
                        tracing::debug!(dir, "Removed empty directory");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(dir, error = %e, "Failed to remove empty directory");
                        false
                    }
                }
            }
            Ok(_) => false,
            Err(e) => {
                tracing::debug!(dir, error = %e, "Skipping directory");
                false
            }
        }
    }
}
