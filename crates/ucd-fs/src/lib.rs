//! Filesystem bridge for the UCD store
//!
//! Provides safe path resolution, a capability-negotiated bridge over local,
//! HTTP and in-memory backends, glob validation and content checksums.

pub mod backend;
pub mod bridge;
pub mod checksum;
pub mod error;
pub mod glob;
pub mod path;

pub use backend::{
    BackendConfig, HttpBackend, HttpBackendConfig, LocalBackend, MemoryBackend, create_bridge,
};
pub use bridge::{
    Backend, Capabilities, Capability, FileEntry, FileSystemBridge, RmOptions, assert_capability,
};
pub use checksum::compute_file_hash;
pub use error::{Error, Result};
pub use glob::{
    FilterConfig, GlobLimits, GlobMatcher, GlobOptions, PathFilter, is_valid_glob_pattern,
    match_glob,
};
pub use path::{is_within_base, resolve_safe_path};
