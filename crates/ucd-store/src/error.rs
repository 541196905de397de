//! Error types for ucd-store

use std::path::PathBuf;

use ucd_fs::Capability;

/// Result type for ucd-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ucd-store operations
///
/// Per-file failures during mirror, clean and repair are not errors; they are
/// collected into the operation reports. Everything here aborts the call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was attempted before `init()`
    #[error("Store is not initialized; call init() first")]
    NotInitialized,

    #[error("Invalid concurrency {value}: must be at least 1")]
    InvalidConcurrency { value: usize },

    /// The version is not listed in the store manifest
    #[error("Version {version} is not managed by this store")]
    VersionNotManaged { version: String },

    /// The version registry does not know the requested version
    #[error("Unknown Unicode version: {version}")]
    UnknownVersion { version: String },

    #[error("File {path} is excluded by the store filters")]
    FileExcluded { path: String },

    /// A manifest or analysis path that does not name a file inside its version
    #[error("Path {path} does not name a file inside the version directory")]
    InvalidFilePath { path: String },

    /// The snapshot exists but is empty, unparsable or malformed
    #[error("Invalid snapshot at {path}: {message}")]
    LockfileInvalid { path: String, message: String },

    /// The snapshot directory is missing and the bridge cannot create it
    #[error("Cannot write snapshot at {path}: bridge does not support '{capability}'")]
    LockfileBridgeUnsupportedOperation {
        path: String,
        capability: Capability,
    },

    /// `.ucd-store.json` exists but cannot be parsed
    #[error("Invalid store manifest at {path}: {message}")]
    StoreManifestInvalid { path: String, message: String },

    #[error("No manifest available for version {version}: {message}")]
    Manifest { version: String, message: String },

    #[error("Remote request for {url} failed: {message}")]
    Remote { url: String, message: String },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension:?}")]
    UnsupportedFormat { extension: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem or path safety error from ucd-fs
    #[error(transparent)]
    Fs(#[from] ucd_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn remote(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Remote {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is caused by a missing file or resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fs(e) if e.is_not_found())
    }
}
