//! Concrete bridge backends and the factory that builds them from config.

mod http;
mod local;
mod memory;

pub use http::{HttpBackend, HttpBackendConfig};
pub use local::LocalBackend;
pub use memory::MemoryBackend;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::bridge::FileSystemBridge;

/// Backend selection as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Directory on local disk; full capability set.
    Local { root: PathBuf },
    /// Remote HTTP tree; read-only apart from listing.
    Http(HttpBackendConfig),
    /// Ephemeral in-memory store; full capability set.
    Memory,
}

/// Build a bridge for the configured backend.
pub fn create_bridge(config: &BackendConfig) -> Result<FileSystemBridge> {
    let bridge = match config {
        BackendConfig::Local { root } => FileSystemBridge::new(LocalBackend::new(root)),
        BackendConfig::Http(http) => FileSystemBridge::new(HttpBackend::new(http)?),
        BackendConfig::Memory => FileSystemBridge::new(MemoryBackend::new()),
    };
    tracing::debug!(
        backend = bridge.backend_name(),
        capabilities = ?bridge.capabilities(),
        "Created filesystem bridge"
    );
    Ok(bridge)
}
