//! [`TestStoreDir`]: a temporary on-disk store for local backend scenarios.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use ucd_fs::{FileSystemBridge, LocalBackend};

/// A temporary store directory with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use ucd_test_utils::store::TestStoreDir;
///
/// let dir = TestStoreDir::new();
/// dir.write_file("16.0.0/A.txt", "a");
/// let bridge = dir.bridge();
/// dir.assert_file_exists("16.0.0/A.txt");
/// ```
pub struct TestStoreDir {
    temp_dir: TempDir,
}

impl Default for TestStoreDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStoreDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A bridge over a [`LocalBackend`] rooted at this directory.
    pub fn bridge(&self) -> FileSystemBridge {
        FileSystemBridge::new(LocalBackend::new(self.root()))
    }

    /// Write `content` to `path` (relative to root), creating parents.
    pub fn write_file(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }

    pub fn read_file(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read_file(path);
        assert!(
            file_content.contains(content),
            "File {path} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}
