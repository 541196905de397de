//! Capability-negotiated filesystem bridge
//!
//! A [`FileSystemBridge`] wraps one [`Backend`] behind a uniform operation set.
//! Every path is resolved through [`resolve_safe_path`] against the backend's
//! root before the backend sees it, and every optional operation checks the
//! backend's [`Capabilities`] before doing any work.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::path::{relative_to, resolve_safe_path};
use crate::{Error, Result};

/// Operations a bridge may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Write,
    Exists,
    Listdir,
    Mkdir,
    Rm,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Self::Read,
        Self::Write,
        Self::Exists,
        Self::Listdir,
        Self::Mkdir,
        Self::Rm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Exists => "exists",
            Self::Listdir => "listdir",
            Self::Mkdir => "mkdir",
            Self::Rm => "rm",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional operations a backend implements. `read` and `exists` are
/// always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub write: bool,
    pub listdir: bool,
    pub mkdir: bool,
    pub rm: bool,
}

impl Capabilities {
    pub const fn full() -> Self {
        Self {
            write: true,
            listdir: true,
            mkdir: true,
            rm: true,
        }
    }

    pub const fn read_only() -> Self {
        Self {
            write: false,
            listdir: false,
            mkdir: false,
            rm: false,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read | Capability::Exists => true,
            Capability::Write => self.write,
            Capability::Listdir => self.listdir,
            Capability::Mkdir => self.mkdir,
            Capability::Rm => self.rm,
        }
    }

    /// Every capability this record grants, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.supports(*c))
    }
}

/// A node in a directory listing.
///
/// A child's `path` is its parent's `path` + `/` + its `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileEntry {
    File {
        name: String,
        path: String,
    },
    Directory {
        name: String,
        path: String,
        #[serde(default)]
        children: Vec<FileEntry>,
    },
}

impl FileEntry {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<FileEntry>,
    ) -> Self {
        Self::Directory {
            name: name.into(),
            path: path.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Directory { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Collect the paths of every file in `entries`, depth first.
    pub fn flatten(entries: &[FileEntry]) -> Vec<String> {
        let mut out = Vec::new();
        for entry in entries {
            match entry {
                Self::File { path, .. } => out.push(path.clone()),
                Self::Directory { children, .. } => out.extend(Self::flatten(children)),
            }
        }
        out
    }
}

/// Options for [`FileSystemBridge::rm`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Remove directories together with their contents.
    pub recursive: bool,
    /// Do not fail when the target is missing.
    pub force: bool,
}

/// A concrete storage backend.
///
/// Paths passed to a backend are already resolved and lie under
/// [`Backend::root`]. Optional operations default to
/// [`Error::UnsupportedOperation`]; a backend that overrides one must also
/// report it in [`Backend::capabilities`].
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Short backend name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Root every path is resolved against.
    fn root(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    async fn exists(&self, path: &str) -> Result<bool>;

    async fn write(&self, _path: &str, _data: &[u8]) -> Result<()> {
        Err(self.unsupported(Capability::Write))
    }

    /// List `path`; entry paths are relative to `path`.
    async fn listdir(&self, _path: &str, _recursive: bool) -> Result<Vec<FileEntry>> {
        Err(self.unsupported(Capability::Listdir))
    }

    async fn mkdir(&self, _path: &str) -> Result<()> {
        Err(self.unsupported(Capability::Mkdir))
    }

    async fn rm(&self, _path: &str, _options: RmOptions) -> Result<()> {
        Err(self.unsupported(Capability::Rm))
    }

    fn unsupported(&self, capability: Capability) -> Error {
        Error::UnsupportedOperation {
            capability,
            backend: self.name(),
        }
    }
}

/// Uniform, path-safe front for a [`Backend`].
///
/// Cheap to clone and safe to share between concurrent tasks.
#[derive(Debug, Clone)]
pub struct FileSystemBridge {
    backend: Arc<dyn Backend>,
}

impl FileSystemBridge {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().supports(capability)
    }

    /// Resolve `path` against the backend root.
    pub fn resolve(&self, path: &str) -> Result<String> {
        resolve_safe_path(self.backend.root(), path)
    }

    /// Express an absolute, resolved path relative to the backend root.
    pub fn relative(&self, resolved: &str) -> Option<String> {
        relative_to(self.backend.root(), resolved)
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path)?;
        self.backend.read(&resolved).await
    }

    /// Read a file and decode it as UTF-8 (lossily).
    pub async fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let resolved = self.resolve(path)?;
        self.backend.exists(&resolved).await
    }

    pub async fn write(&self, path: &str, data: impl AsRef<[u8]>) -> Result<()> {
        self.require(Capability::Write)?;
        let resolved = self.resolve(path)?;
        self.backend.write(&resolved, data.as_ref()).await
    }

    pub async fn listdir(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        self.require(Capability::Listdir)?;
        let resolved = self.resolve(path)?;
        self.backend.listdir(&resolved, recursive).await
    }

    pub async fn mkdir(&self, path: &str) -> Result<()> {
        self.require(Capability::Mkdir)?;
        let resolved = self.resolve(path)?;
        self.backend.mkdir(&resolved).await
    }

    pub async fn rm(&self, path: &str, options: RmOptions) -> Result<()> {
        self.require(Capability::Rm)?;
        let resolved = self.resolve(path)?;
        self.backend.rm(&resolved, options).await
    }

    fn require(&self, capability: Capability) -> Result<()> {
        assert_capability(self, &[capability])
    }
}

/// Fail with [`Error::UnsupportedOperation`] unless `bridge` supports every
/// capability in `required`.
///
/// Call this before starting work that needs optional operations so that
/// nothing is done when one of them is missing.
pub fn assert_capability(bridge: &FileSystemBridge, required: &[Capability]) -> Result<()> {
    let capabilities = bridge.capabilities();
    match required.iter().find(|c| !capabilities.supports(**c)) {
        Some(missing) => Err(Error::UnsupportedOperation {
            capability: *missing,
            backend: bridge.backend_name(),
        }),
        None => Ok(()),
    }
}
