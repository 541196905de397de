//! Local Unicode Character Database store
//!
//! Keeps a local copy of UCD releases in sync with their expected manifests,
//! on top of the capability-negotiated bridge from `ucd-fs`:
//!
//! - **Store manifest**: `.ucd-store.json` lists the managed versions
//! - **Snapshots**: per-version `snapshot.json` with content hashes
//! - **Reconciliation**: analyze, mirror, clean and repair, batched under
//!   bounded concurrency with per-file results
//!
//! # Architecture
//!
//! ```text
//!        caller
//!          |
//!       UcdStore ---- ManifestSource / ContentSource / VersionRegistry
//!          |
//!   FileSystemBridge (ucd-fs)
//!          |
//!   local | http | memory backend
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ucd_fs::{FileSystemBridge, LocalBackend};
//! use ucd_store::{MirrorOptions, StaticManifestSource, HttpContentSource, UcdStore};
//!
//! async fn example() -> ucd_store::Result<()> {
//!     let bridge = FileSystemBridge::new(LocalBackend::new("./ucd"));
//!     let manifest = StaticManifestSource::new().with_paths("16.0.0", ["ucd/UnicodeData.txt"]);
//!     let content = HttpContentSource::new("https://unicode.org/Public", Duration::from_secs(30))?;
//!
//!     let mut store = UcdStore::builder(bridge, manifest, content)
//!         .versions(["16.0.0"])
//!         .build()?;
//!     store.init().await?;
//!     store.mirror(&MirrorOptions::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod layout;
pub mod logging;
pub mod manifest;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod version;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use manifest::{ExpectedFile, STORE_MANIFEST_FILE, StoreManifest};
pub use report::{
    CleanReport, FailedFile, FileOperation, MirrorReport, RepairReport, RepairStatus,
    VersionAnalysis,
};
pub use snapshot::{
    SNAPSHOT_FILE, Snapshot, SnapshotEntry, compute_content_hash, read_snapshot,
    read_snapshot_or_default, write_snapshot,
};
pub use source::{
    ContentSource, FetchedContent, HttpContentSource, ManifestSource, MemoryContentSource,
    StaticManifestSource, StaticVersionRegistry, VersionRegistry,
};
pub use store::{CleanOptions, MirrorOptions, RepairOptions, StoreBuilder, UcdStore};
