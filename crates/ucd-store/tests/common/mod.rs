//! Shared setup for store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ucd_fs::{Backend, FileSystemBridge, MemoryBackend};
use ucd_store::{FetchedContent, MemoryContentSource, StaticManifestSource, UcdStore};
use ucd_test_utils::ucd::sample_files;

pub use ucd_test_utils::ucd::SAMPLE_VERSION as VERSION;

/// Manifest and content for the sample release of every version in `versions`.
pub fn sources(versions: &[&str]) -> (StaticManifestSource, MemoryContentSource) {
    let mut manifest = StaticManifestSource::new();
    let mut content = MemoryContentSource::new();
    for version in versions {
        let files = sample_files(version);
        manifest = manifest.with_paths(*version, files.iter().map(|(path, _)| *path));
        for (path, body) in files {
            content.insert(*version, path, FetchedContent::text(body));
        }
    }
    (manifest, content)
}

/// An initialized store over `backend` managing `versions`.
pub async fn store_over(backend: Arc<dyn Backend>, versions: &[&str]) -> UcdStore {
    let (manifest, content) = sources(versions);
    let mut store = UcdStore::builder(FileSystemBridge::from_arc(backend), manifest, content)
        .versions(versions.iter().copied())
        .build()
        .unwrap();
    store.init().await.unwrap();
    store
}

/// The sample body of `path` as served by [`sources`].
pub fn sample_content(version: &str, path: &str) -> String {
    sample_files(version)
        .into_iter()
        .find(|(p, _)| *p == path)
        .map(|(_, body)| body)
        .unwrap()
}

/// `16.0.0` with `A.txt` mirrored and an unexpected `orphan.txt`.
pub fn drifted_backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_file("16.0.0/A.txt", sample_content(VERSION, "A.txt"))
            .with_file("16.0.0/orphan.txt", "stale"),
    )
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
