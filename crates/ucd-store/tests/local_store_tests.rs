//! End-to-end scenarios against the local filesystem backend

mod common;

use common::{VERSION, sample_content, sources};
use ucd_store::{CleanOptions, MirrorOptions, RepairOptions, StoreConfig, UcdStore};
use ucd_test_utils::store::TestStoreDir;

async fn local_store(dir: &TestStoreDir) -> UcdStore {
    let (manifest, content) = sources(&[VERSION]);
    let config = StoreConfig {
        base_path: "ucd".to_string(),
        versions: vec![VERSION.to_string()],
        ..StoreConfig::default()
    };
    let mut store = UcdStore::builder(dir.bridge(), manifest, content)
        .config(config)
        .build()
        .unwrap();
    store.init().await.unwrap();
    store
}

#[tokio::test]
async fn test_mirror_to_disk() {
    let dir = TestStoreDir::new();
    let store = local_store(&dir).await;

    store.mirror(&MirrorOptions::default()).await.unwrap();

    dir.assert_file_exists("ucd/.ucd-store.json");
    dir.assert_file_contains("ucd/.ucd-store.json", "\"16.0.0\"");
    dir.assert_file_exists("ucd/16.0.0/A.txt");
    assert_eq!(
        dir.read_file("ucd/16.0.0/nested/C.txt"),
        sample_content(VERSION, "nested/C.txt")
    );
    dir.assert_file_contains("ucd/16.0.0/snapshot.json", "\"unicodeVersion\": \"16.0.0\"");
}

#[tokio::test]
async fn test_repair_on_disk() {
    let dir = TestStoreDir::new();
    dir.write_file("ucd/16.0.0/A.txt", &sample_content(VERSION, "A.txt"));
    dir.write_file("ucd/16.0.0/stale/orphan.txt", "stale");
    let store = local_store(&dir).await;

    let report = &store.repair(&RepairOptions::default()).await.unwrap()[0];
    assert!(report.is_success());

    dir.assert_file_exists("ucd/16.0.0/B.txt");
    dir.assert_file_not_exists("ucd/16.0.0/stale/orphan.txt");
    dir.assert_file_not_exists("ucd/16.0.0/stale");
}

#[tokio::test]
async fn test_clean_removes_emptied_version_directory() {
    let dir = TestStoreDir::new();
    dir.write_file("ucd/16.0.0/old/x.txt", "x");
    let store = local_store(&dir).await;

    let report = &store.clean(&CleanOptions::default()).await.unwrap()[0];
    assert_eq!(report.deleted, vec!["old/x.txt"]);
    assert_eq!(report.removed_directories, vec!["16.0.0/old", "16.0.0"]);

    dir.assert_file_not_exists("ucd/16.0.0");
    dir.assert_file_exists("ucd/.ucd-store.json");
}
