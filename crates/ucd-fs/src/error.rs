//! Error types for ucd-fs

use crate::bridge::Capability;
use std::path::PathBuf;

/// Result type for ucd-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ucd-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested path contains a null byte or an ASCII control character
    #[error("Illegal character in path: {path:?}")]
    IllegalCharacterInPath { path: String },

    /// The requested path resolves outside of the base directory
    #[error("Path traversal detected: {requested:?} escapes base {base:?}")]
    PathTraversal { base: String, requested: String },

    /// Percent-decoding did not settle or produced invalid UTF-8
    #[error("Failed to decode path: {path:?}")]
    FailedToDecodePath { path: String },

    /// The backend does not implement an optional operation
    #[error("Operation '{capability}' is not supported by the {backend} backend")]
    UnsupportedOperation {
        capability: Capability,
        backend: &'static str,
    },

    #[error("File or directory not found: {path}")]
    NotFound { path: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("HTTP request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid directory listing from {url}: {message}")]
    InvalidListing { url: String, message: String },

    #[error("Invalid glob pattern: {pattern:?}")]
    InvalidGlobPattern { pattern: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }

    /// Whether this error means the target simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::HttpStatus { status, .. } => *status == 404,
            _ => false,
        }
    }
}
