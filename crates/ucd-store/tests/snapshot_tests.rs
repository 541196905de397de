//! Tests for the snapshot codec

use rstest::rstest;
use ucd_fs::{Capabilities, Capability, FileSystemBridge, MemoryBackend, compute_file_hash};
use ucd_store::{
    Error, Snapshot, compute_content_hash, read_snapshot, read_snapshot_or_default, write_snapshot,
};
use ucd_test_utils::ucd::ucd_file;

fn bridge_with_snapshot(content: &str) -> FileSystemBridge {
    FileSystemBridge::new(MemoryBackend::new().with_file("16.0.0/snapshot.json", content))
}

fn sample() -> Snapshot {
    Snapshot::from_files("16.0.0", [("A.txt", "a"), ("nested/B.txt", "bb")])
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let bridge = FileSystemBridge::new(MemoryBackend::new());
    let snapshot = sample();

    write_snapshot(&bridge, "", "16.0.0", &snapshot).await.unwrap();
    let read = read_snapshot(&bridge, "", "16.0.0").await.unwrap();

    assert_eq!(read, snapshot);
    assert_eq!(read.files["nested/B.txt"].file_hash, compute_file_hash("bb"));
}

#[test]
fn test_snapshot_is_pretty_printed() {
    let json = sample().to_json_pretty().unwrap();
    insta::assert_snapshot!(json.trim_end(), @r#"
    {
      "unicodeVersion": "16.0.0",
      "files": {
        "A.txt": {
          "hash": "sha256:ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
          "fileHash": "sha256:ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
          "size": 1
        },
        "nested/B.txt": {
          "hash": "sha256:3b64db95cb55c763391c707108489ae18b4112d783300de38e033b4c98c3deaf",
          "fileHash": "sha256:3b64db95cb55c763391c707108489ae18b4112d783300de38e033b4c98c3deaf",
          "size": 2
        }
      }
    }
    "#);
}

#[rstest]
#[case::empty("", "snapshot is empty")]
#[case::whitespace("  \n", "snapshot is empty")]
#[case::not_json("{not json", "snapshot is not valid JSON")]
#[case::missing_files(r#"{"unicodeVersion":"16.0.0"}"#, "snapshot does not match expected schema")]
#[case::missing_version(r#"{"files":{}}"#, "snapshot does not match expected schema")]
#[case::bad_hash(
    r#"{"unicodeVersion":"16.0.0","files":{"A.txt":{"hash":"sha256:xyz","fileHash":"sha256:xyz","size":1}}}"#,
    "snapshot does not match expected schema"
)]
#[tokio::test]
async fn test_strict_read_rejects_invalid_snapshots(#[case] content: &str, #[case] message: &str) {
    let bridge = bridge_with_snapshot(content);

    let err = read_snapshot(&bridge, "", "16.0.0").await.unwrap_err();
    assert!(matches!(err, Error::LockfileInvalid { .. }));
    assert!(
        err.to_string().contains(message),
        "expected {message:?} in {err}"
    );

    // The lenient reader treats the same input as absent
    assert_eq!(read_snapshot_or_default(&bridge, "", "16.0.0").await, None);
}

#[tokio::test]
async fn test_missing_snapshot() {
    let bridge = FileSystemBridge::new(MemoryBackend::new());

    let err = read_snapshot(&bridge, "", "16.0.0").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(read_snapshot_or_default(&bridge, "", "16.0.0").await, None);
}

#[tokio::test]
async fn test_write_without_mkdir_fails_when_directory_is_missing() {
    let bridge = FileSystemBridge::new(MemoryBackend::new().with_capabilities(Capabilities {
        write: true,
        ..Capabilities::read_only()
    }));

    let err = write_snapshot(&bridge, "", "16.0.0", &sample())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::LockfileBridgeUnsupportedOperation {
            capability: Capability::Mkdir,
            ..
        }
    ));
}

#[tokio::test]
async fn test_write_on_read_only_bridge_is_a_no_op() {
    let bridge = FileSystemBridge::new(MemoryBackend::new().with_capabilities(Capabilities::read_only()));

    write_snapshot(&bridge, "", "16.0.0", &sample()).await.unwrap();
    assert!(!bridge.exists("16.0.0/snapshot.json").await.unwrap());
}

#[test]
fn test_content_hash_survives_release_header_changes() {
    let body = "0041..005A; Latin\n";
    let v15 = ucd_file("Scripts.txt", "15.1.0", body);
    let v16 = ucd_file("Scripts.txt", "16.0.0", body);

    let a = Snapshot::from_files("15.1.0", [("Scripts.txt", &v15)]);
    let b = Snapshot::from_files("16.0.0", [("Scripts.txt", &v16)]);

    assert_eq!(a.files["Scripts.txt"].hash, b.files["Scripts.txt"].hash);
    assert_ne!(a.files["Scripts.txt"].file_hash, b.files["Scripts.txt"].file_hash);
    assert_eq!(a.files["Scripts.txt"].hash, compute_content_hash(body));
}

#[test]
fn test_file_hash_is_representation_independent() {
    let text = "0041;LATIN CAPITAL LETTER A;Lu";
    let hash = compute_file_hash(text);

    assert_eq!(hash.len(), 71);
    assert!(hash.starts_with("sha256:"));
    assert_eq!(hash, compute_file_hash(text.as_bytes()));
    assert_eq!(hash, compute_file_hash(text.as_bytes().to_vec()));
    assert_eq!(hash, compute_file_hash(String::from(text)));
}
