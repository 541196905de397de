//! [`FaultyBackend`]: an in-memory backend that fails on demand.
//!
//! Failures are keyed by path suffix, so `"16.0.0/B.txt"` matches the
//! resolved path `/store/16.0.0/B.txt` but not `/store/16.0.0/AB.txt`.

use async_trait::async_trait;
use ucd_fs::{Backend, Capabilities, Error, FileEntry, MemoryBackend, Result, RmOptions};

/// Wraps a [`MemoryBackend`] and injects failures for selected paths.
///
/// # Example
///
/// ```rust
/// use ucd_fs::MemoryBackend;
/// use ucd_test_utils::backend::FaultyBackend;
///
/// let backend = FaultyBackend::new(MemoryBackend::new())
///     .fail_write("16.0.0/B.txt")
///     .vanish("16.0.0/orphan.txt");
/// ```
#[derive(Debug)]
pub struct FaultyBackend {
    inner: MemoryBackend,
    fail_writes: Vec<String>,
    fail_removes: Vec<String>,
    vanished: Vec<String>,
}

impl FaultyBackend {
    pub fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            fail_writes: Vec::new(),
            fail_removes: Vec::new(),
            vanished: Vec::new(),
        }
    }

    /// Make every write to `suffix` fail with an I/O error.
    pub fn fail_write(mut self, suffix: &str) -> Self {
        self.fail_writes.push(suffix.trim_start_matches('/').to_string());
        self
    }

    /// Make every removal of `suffix` fail with an I/O error.
    pub fn fail_remove(mut self, suffix: &str) -> Self {
        self.fail_removes.push(suffix.trim_start_matches('/').to_string());
        self
    }

    /// Report `suffix` as absent from `exists` while listings still show it,
    /// as if another process deleted it between the two calls.
    pub fn vanish(mut self, suffix: &str) -> Self {
        self.vanished.push(suffix.trim_start_matches('/').to_string());
        self
    }

    /// The wrapped backend, for inspecting what was actually written.
    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

fn hits(suffixes: &[String], path: &str) -> bool {
    suffixes
        .iter()
        .any(|s| path == s || path.ends_with(&format!("/{s}")))
}

fn injected(path: &str, operation: &str) -> Error {
    Error::io(
        path,
        std::io::Error::other(format!("injected {operation} failure")),
    )
}

#[async_trait]
impl Backend for FaultyBackend {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn root(&self) -> &str {
        self.inner.root()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        if hits(&self.vanished, path) {
            return Ok(false);
        }
        self.inner.exists(path).await
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        if hits(&self.fail_writes, path) {
            return Err(injected(path, "write"));
        }
        self.inner.write(path, data).await
    }

    async fn listdir(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        self.inner.listdir(path, recursive).await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        self.inner.mkdir(path).await
    }

    async fn rm(&self, path: &str, options: RmOptions) -> Result<()> {
        if hits(&self.fail_removes, path) {
            return Err(injected(path, "remove"));
        }
        self.inner.rm(path, options).await
    }
}
