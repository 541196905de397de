//! Bridge behaviour over the in-memory backend.

use pretty_assertions::assert_eq;
use ucd_fs::{
    Capabilities, Capability, Error, FileEntry, FileSystemBridge, MemoryBackend, RmOptions,
    assert_capability,
};

fn seeded() -> FileSystemBridge {
    FileSystemBridge::new(
        MemoryBackend::new()
            .with_file("16.0.0/A.txt", "a")
            .with_file("16.0.0/nested/C.txt", "c")
            .with_file("16.0.0/nested/deep/D.txt", "d"),
    )
}

#[tokio::test]
async fn read_and_exists_go_through_the_resolver() {
    let bridge = seeded();
    assert_eq!(bridge.read_to_string("16.0.0/A.txt").await.unwrap(), "a");
    assert_eq!(bridge.read("/16.0.0/nested/../A.txt").await.unwrap(), b"a");
    assert!(bridge.exists("16.0.0\\nested\\C.txt").await.unwrap());

    let err = bridge.read("../16.0.0/A.txt").await.unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }));
}

#[tokio::test]
async fn missing_file_reports_not_found() {
    let bridge = seeded();
    let err = bridge.read("16.0.0/missing.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn traversal_on_write_performs_no_work() {
    let backend = std::sync::Arc::new(MemoryBackend::new());
    let bridge = FileSystemBridge::from_arc(backend.clone());

    let err = bridge.write("a/../../escape.txt", "x").await.unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }));
    assert!(backend.file_paths().is_empty());
}

#[tokio::test]
async fn recursive_listing_builds_child_paths_from_parents() {
    let bridge = seeded();
    let tree = bridge.listdir("16.0.0", true).await.unwrap();

    fn check(entries: &[FileEntry], parent: &str) {
        for entry in entries {
            let expected = if parent.is_empty() {
                entry.name().to_string()
            } else {
                format!("{parent}/{}", entry.name())
            };
            assert_eq!(entry.path(), expected);
            if let FileEntry::Directory { children, path, .. } = entry {
                check(children, path);
            }
        }
    }
    check(&tree, "");

    assert_eq!(
        FileEntry::flatten(&tree),
        vec!["A.txt", "nested/C.txt", "nested/deep/D.txt"]
    );
}

#[tokio::test]
async fn shallow_listing_leaves_directories_empty() {
    let bridge = seeded();
    let entries = bridge.listdir("16.0.0", false).await.unwrap();
    assert_eq!(
        entries,
        vec![
            FileEntry::file("A.txt", "A.txt"),
            FileEntry::directory("nested", "nested", vec![]),
        ]
    );
}

#[tokio::test]
async fn assert_capability_names_the_missing_operation() {
    let bridge = FileSystemBridge::new(
        MemoryBackend::new().with_capabilities(Capabilities {
            write: true,
            ..Capabilities::read_only()
        }),
    );

    assert!(assert_capability(&bridge, &[Capability::Read, Capability::Write]).is_ok());

    let err = assert_capability(&bridge, &[Capability::Write, Capability::Rm]).unwrap_err();
    match err {
        Error::UnsupportedOperation {
            capability,
            backend,
        } => {
            assert_eq!(capability, Capability::Rm);
            assert_eq!(backend, "memory");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_operations_fail_closed() {
    let backend = std::sync::Arc::new(
        MemoryBackend::new()
            .with_file("keep.txt", "k")
            .with_capabilities(Capabilities::read_only()),
    );
    let bridge = FileSystemBridge::from_arc(backend.clone());

    assert!(matches!(
        bridge.write("new.txt", "x").await,
        Err(Error::UnsupportedOperation {
            capability: Capability::Write,
            ..
        })
    ));
    assert!(matches!(
        bridge.rm("keep.txt", RmOptions::default()).await,
        Err(Error::UnsupportedOperation {
            capability: Capability::Rm,
            ..
        })
    ));
    assert!(matches!(
        bridge.listdir("", false).await,
        Err(Error::UnsupportedOperation {
            capability: Capability::Listdir,
            ..
        })
    ));
    // Capability is checked before the path: even a hostile path yields the
    // capability error and nothing is touched.
    assert!(matches!(
        bridge.mkdir("../../x").await,
        Err(Error::UnsupportedOperation {
            capability: Capability::Mkdir,
            ..
        })
    ));
    assert_eq!(backend.file_paths(), vec!["/keep.txt"]);
}

#[tokio::test]
async fn rm_with_force_ignores_missing_targets() {
    let bridge = seeded();
    let force = RmOptions {
        force: true,
        ..RmOptions::default()
    };
    bridge.rm("16.0.0/nope.txt", force).await.unwrap();

    let err = bridge
        .rm("16.0.0/nope.txt", RmOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn mkdir_then_listdir_shows_empty_directory() {
    let bridge = FileSystemBridge::new(MemoryBackend::new());
    bridge.mkdir("17.0.0/extracted").await.unwrap();
    assert!(bridge.exists("17.0.0").await.unwrap());
    assert_eq!(
        bridge.listdir("17.0.0", true).await.unwrap(),
        vec![FileEntry::directory("extracted", "extracted", vec![])]
    );
}
