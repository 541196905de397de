use std::collections::{BTreeMap, BTreeSet};

use ucd_fs::{Capability, assert_capability};

use super::UcdStore;
use super::clean::RemoveRun;
use super::mirror::MirrorRun;
use crate::Result;
use crate::report::{FailedFile, FileOperation, MirrorReport, RepairReport};

/// Options for [`UcdStore::repair`].
#[derive(Debug, Clone, Default)]
pub struct RepairOptions {
    /// Versions to repair; all managed versions when empty
    pub versions: Vec<String>,
    /// Files processed in parallel; the store default when `None`
    pub concurrency: Option<usize>,
    /// Categorize without downloading or deleting anything
    pub dry_run: bool,
}

const NOT_RESTORED: &str = "File was not restored";

impl UcdStore {
    /// Restore missing files and delete orphans, version by version.
    ///
    /// Unlike [`UcdStore::clean`], an orphan that is already gone when its
    /// removal is attempted counts as a failure. A failing version does not
    /// stop the others.
    pub async fn repair(&self, options: &RepairOptions) -> Result<Vec<RepairReport>> {
        let concurrency = self.concurrency(options.concurrency)?;
        let versions = self.select_versions(&options.versions)?;
        assert_capability(
            &self.bridge,
            &[
                Capability::Listdir,
                Capability::Write,
                Capability::Mkdir,
                Capability::Rm,
            ],
        )?;

        let mut reports = Vec::with_capacity(versions.len());
        for version in &versions {
            let report = self.repair_version(version, concurrency, options.dry_run).await;
            tracing::info!(
                version = %version,
                restored = report.restored.len(),
                removed = report.removed.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                status = ?report.status,
                "Repaired version"
            );
            reports.push(report);
        }
        Ok(reports)
    }

    async fn repair_version(&self, version: &str, concurrency: usize, dry_run: bool) -> RepairReport {
        let drift = match self.drift(version).await {
            Ok(drift) => drift,
            Err(e) => {
                tracing::warn!(version, error = %e, "Could not analyze version");
                return RepairReport::analysis_failed(version, e);
            }
        };
        let analysis = &drift.analysis;

        // Restore
        let missing: BTreeSet<&str> = analysis.missing_files.iter().map(String::as_str).collect();
        let to_restore: Vec<_> = drift
            .expected
            .iter()
            .filter(|f| missing.contains(f.local_path(version).as_str()))
            .cloned()
            .collect();
        let mirror_run = MirrorRun {
            concurrency,
            dry_run,
            force: true,
        };
        let (mirror, entries) = self.mirror_files(version, &to_restore, mirror_run).await;
        let (restored, mut failed) = restore_outcome(&analysis.missing_files, &mirror);

        // Remove
        let remove_run = RemoveRun {
            concurrency,
            dry_run,
            strict: true,
        };
        let removal = self
            .remove_files(version, &analysis.orphaned_files, remove_run)
            .await;
        failed.extend(removal.failed);

        // Everything else was already in place
        let orphaned: BTreeSet<&str> = analysis.orphaned_files.iter().map(String::as_str).collect();
        let skipped: Vec<String> = analysis
            .files
            .iter()
            .filter(|f| !orphaned.contains(f.as_str()))
            .cloned()
            .collect();

        if !dry_run {
            self.prune_empty_directories(version, &removal.removed).await;
            let changed = !restored.is_empty() || !removal.removed.is_empty();
            if changed && failed.is_empty() {
                self.record_snapshot(version, &drift.expected, entries).await;
            }
        }

        RepairReport::new(version, restored, removal.removed, skipped, failed)
    }
}

/// Sort every missing path into restored or failed.
///
/// Paths the mirror neither wrote nor reported as failed are failures too,
/// so each missing path lands in exactly one list.
fn restore_outcome(missing: &[String], mirror: &MirrorReport) -> (Vec<String>, Vec<FailedFile>) {
    let mirrored: BTreeSet<&str> = mirror.mirrored.iter().map(String::as_str).collect();
    let errors: BTreeMap<&str, &str> = mirror
        .failed
        .iter()
        .map(|f| (f.file_path.as_str(), f.error.as_str()))
        .collect();

    let mut restored = Vec::new();
    let mut failed = Vec::new();
    for path in missing {
        if mirrored.contains(path.as_str()) {
            restored.push(path.clone());
        } else {
            let error = errors.get(path.as_str()).copied().unwrap_or(NOT_RESTORED);
            failed.push(FailedFile::new(path.as_str(), FileOperation::Download, error));
        }
    }
    (restored, failed)
}
