//! Result types for analyze, mirror, clean and repair
//!
//! Every report is per version. Within a report each input path lands in
//! exactly one category, and every category list is sorted.

use serde::{Deserialize, Serialize};

/// The step a per-file failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Analyze,
    Exists,
    Download,
    Mkdir,
    Write,
    Remove,
}

/// A file an operation could not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub file_path: String,
    pub operation: FileOperation,
    pub error: String,
}

impl FailedFile {
    pub fn new(file_path: impl Into<String>, operation: FileOperation, error: impl ToString) -> Self {
        Self {
            file_path: file_path.into(),
            operation,
            error: error.to_string(),
        }
    }
}

fn sort_failed(failed: &mut [FailedFile]) {
    failed.sort_by(|a, b| a.file_path.cmp(&b.file_path));
}

/// Drift between the expected manifest and the files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionAnalysis {
    pub version: String,
    /// Files present on disk
    pub files: Vec<String>,
    /// Expected but not on disk
    pub missing_files: Vec<String>,
    /// On disk but not expected
    pub orphaned_files: Vec<String>,
    pub file_count: usize,
    pub expected_file_count: usize,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorReport {
    pub version: String,
    pub mirrored: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl MirrorReport {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            mirrored: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn sort(&mut self) {
        self.mirrored.sort();
        self.skipped.sort();
        sort_failed(&mut self.failed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub version: String,
    pub deleted: Vec<String>,
    /// Orphans that were already gone
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
    /// Directories removed after becoming empty, relative to the store base
    pub removed_directories: Vec<String>,
}

impl CleanReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub version: String,
    pub restored: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
    pub status: RepairStatus,
}

impl RepairReport {
    /// Assemble a report; status follows from whether anything failed.
    pub fn new(
        version: impl Into<String>,
        mut restored: Vec<String>,
        mut removed: Vec<String>,
        mut skipped: Vec<String>,
        mut failed: Vec<FailedFile>,
    ) -> Self {
        restored.sort();
        removed.sort();
        skipped.sort();
        sort_failed(&mut failed);

        let status = if failed.is_empty() {
            RepairStatus::Success
        } else {
            RepairStatus::Failure
        };

        Self {
            version: version.into(),
            restored,
            removed,
            skipped,
            failed,
            status,
        }
    }

    /// A version whose drift could not be computed.
    pub fn analysis_failed(version: &str, error: impl ToString) -> Self {
        Self::new(
            version,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![FailedFile::new(version, FileOperation::Analyze, error)],
        )
    }

    pub fn is_success(&self) -> bool {
        self.status == RepairStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_status_follows_failures() {
        let ok = RepairReport::new("16.0.0", vec!["B.txt".into()], vec![], vec![], vec![]);
        assert_eq!(ok.status, RepairStatus::Success);

        let failed = RepairReport::analysis_failed("16.0.0", "manifest unavailable");
        assert_eq!(failed.status, RepairStatus::Failure);
        assert_eq!(failed.failed[0].operation, FileOperation::Analyze);
    }

    #[test]
    fn reports_sort_their_categories() {
        let report = RepairReport::new(
            "16.0.0",
            vec!["b".into(), "a".into()],
            vec![],
            vec!["z".into(), "y".into()],
            vec![
                FailedFile::new("q", FileOperation::Remove, "x"),
                FailedFile::new("p", FileOperation::Download, "x"),
            ],
        );
        assert_eq!(report.restored, vec!["a", "b"]);
        assert_eq!(report.skipped, vec!["y", "z"]);
        assert_eq!(report.failed[0].file_path, "p");
    }

    #[test]
    fn failed_file_serializes_in_camel_case() {
        let failed = FailedFile::new("A.txt", FileOperation::Write, "disk full");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["filePath"], "A.txt");
        assert_eq!(json["operation"], "write");
    }
}
