//! Per-version snapshot (lockfile) codec
//!
//! A snapshot records, for every file of a version, the hash of its content
//! and its size. It is written in full after a successful mirror and lives at
//! `<base>/<version>/snapshot.json`:
//!
//! ```json
//! {
//!   "unicodeVersion": "16.0.0",
//!   "files": {
//!     "UnicodeData.txt": { "hash": "sha256:…", "fileHash": "sha256:…", "size": 1234 }
//!   }
//! }
//! ```
//!
//! A snapshot is either wholly well-formed or rejected; readers never see a
//! partially valid one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ucd_fs::checksum::is_valid_checksum;
use ucd_fs::{Capability, FileSystemBridge, compute_file_hash};

use crate::layout::join;
use crate::{Error, Result};

/// File name of the snapshot inside a version directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

const EMPTY: &str = "snapshot is empty";
const NOT_JSON: &str = "snapshot is not valid JSON";
const BAD_SCHEMA: &str = "snapshot does not match expected schema";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub unicode_version: String,
    pub files: BTreeMap<String, SnapshotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Hash of the content with the release header stripped
    pub hash: String,
    /// Hash of the raw bytes
    pub file_hash: String,
    pub size: u64,
}

impl SnapshotEntry {
    pub fn from_content(content: &[u8]) -> Self {
        Self {
            hash: compute_content_hash(content),
            file_hash: compute_file_hash(content),
            size: content.len() as u64,
        }
    }

    fn is_well_formed(&self) -> bool {
        is_valid_checksum(&self.hash) && is_valid_checksum(&self.file_hash)
    }
}

impl Snapshot {
    pub fn new(unicode_version: impl Into<String>) -> Self {
        Self {
            unicode_version: unicode_version.into(),
            files: BTreeMap::new(),
        }
    }

    /// Build a snapshot from `(path, content)` pairs.
    pub fn from_files<I, P, C>(unicode_version: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: AsRef<[u8]>,
    {
        let files = files
            .into_iter()
            .map(|(path, content)| (path.into(), SnapshotEntry::from_content(content.as_ref())))
            .collect();
        Self {
            unicode_version: unicode_version.into(),
            files,
        }
    }

    /// Decode and validate a snapshot from raw bytes.
    ///
    /// `path` only appears in error messages.
    pub fn parse(content: &[u8], path: &str) -> Result<Self> {
        let invalid = |message: &str| Error::LockfileInvalid {
            path: path.to_string(),
            message: message.to_string(),
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(invalid(EMPTY));
        }

        let value: serde_json::Value =
            serde_json::from_slice(content).map_err(|_| invalid(NOT_JSON))?;
        let snapshot: Snapshot = serde_json::from_value(value).map_err(|_| invalid(BAD_SCHEMA))?;

        if !snapshot.files.values().all(SnapshotEntry::is_well_formed) {
            return Err(invalid(BAD_SCHEMA));
        }
        Ok(snapshot)
    }

    /// Pretty-printed JSON, terminated by a newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Bridge path of the snapshot for `version`.
pub fn snapshot_path(base: &str, version: &str) -> String {
    join(&join(base, version), SNAPSHOT_FILE)
}

/// Read the snapshot for `version`, failing on anything but a valid one.
///
/// A missing file propagates the bridge's not-found error.
pub async fn read_snapshot(bridge: &FileSystemBridge, base: &str, version: &str) -> Result<Snapshot> {
    let path = snapshot_path(base, version);
    let content = bridge.read(&path).await?;
    Snapshot::parse(&content, &path)
}

/// Read the snapshot for `version`, treating every failure as absence.
pub async fn read_snapshot_or_default(
    bridge: &FileSystemBridge,
    base: &str,
    version: &str,
) -> Option<Snapshot> {
    match read_snapshot(bridge, base, version).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            tracing::warn!(version, error = %e, "Ignoring unreadable snapshot");
            None
        }
    }
}

/// Write the snapshot for `version`.
///
/// Silently does nothing on a bridge without `write`. Creates the version
/// directory when missing, which requires `mkdir`.
pub async fn write_snapshot(
    bridge: &FileSystemBridge,
    base: &str,
    version: &str,
    snapshot: &Snapshot,
) -> Result<()> {
    if !bridge.supports(Capability::Write) {
        tracing::debug!(version, "Bridge is read-only, snapshot not written");
        return Ok(());
    }

    let path = snapshot_path(base, version);
    let dir = join(base, version);
    if !bridge.exists(&dir).await? {
        if !bridge.supports(Capability::Mkdir) {
            return Err(Error::LockfileBridgeUnsupportedOperation {
                path,
                capability: Capability::Mkdir,
            });
        }
        bridge.mkdir(&dir).await?;
    }

    bridge.write(&path, snapshot.to_json_pretty()?).await?;
    tracing::debug!(version, files = snapshot.files.len(), "Wrote snapshot");
    Ok(())
}

/// Hash `content` after stripping the Unicode release header.
///
/// UCD data files open with a comment block naming the file and release,
/// its date and the copyright notice. Those lines change with every release
/// even when the data does not, so they are excluded. Content that is not
/// UTF-8 is hashed whole.
pub fn compute_content_hash(content: impl AsRef<[u8]>) -> String {
    let bytes = content.as_ref();
    let Ok(text) = std::str::from_utf8(bytes) else {
        return compute_file_hash(bytes);
    };

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !is_header_line(line) {
            break;
        }
        offset += line.len();
    }
    compute_file_hash(&bytes[offset..])
}

fn is_header_line(line: &str) -> bool {
    let Some(comment) = line.trim_end().strip_prefix('#') else {
        return false;
    };
    let body = comment.trim();

    body.is_empty()
        || is_versioned_file_name(body)
        || body.starts_with("Date:")
        || body.starts_with("Copyright")
        || body.starts_with('©')
        || body.starts_with("Unicode and the Unicode Logo")
        || body.starts_with("For terms of use")
}

/// `DerivedAge-16.0.0.txt` and friends.
fn is_versioned_file_name(body: &str) -> bool {
    if body.contains(char::is_whitespace) {
        return false;
    }
    let Some((_, version)) = body.strip_suffix(".txt").and_then(|s| s.rsplit_once('-')) else {
        return false;
    };
    version.split('.').all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(file: &str, date: &str) -> String {
        format!(
            "# {file}\n# Date: {date}\n# © 2024 Unicode®, Inc.\n\
             # For terms of use and license, see https://www.unicode.org/terms_of_use.html\n#\n"
        )
    }

    #[test]
    fn content_hash_ignores_release_header() {
        let body = "# Blocks\n0000..007F; Basic Latin\n";
        let old = format!("{}{body}", header("Blocks-15.1.0.txt", "2023-07-28"));
        let new = format!("{}{body}", header("Blocks-16.0.0.txt", "2024-02-02"));

        assert_eq!(compute_content_hash(&old), compute_content_hash(&new));
        assert_ne!(compute_file_hash(&old), compute_file_hash(&new));
    }

    #[test]
    fn content_hash_keeps_data_changes() {
        let a = format!("{}0000..007F; Basic Latin\n", header("Blocks-16.0.0.txt", "x"));
        let b = format!("{}0000..007F; Latin\n", header("Blocks-16.0.0.txt", "x"));
        assert_ne!(compute_content_hash(&a), compute_content_hash(&b));
    }

    #[test]
    fn content_without_header_hashes_whole() {
        let text = "0041;LATIN CAPITAL LETTER A;Lu;0;L;;;;;N;;;;0061;\n";
        assert_eq!(compute_content_hash(text), compute_file_hash(text));

        let binary = [0xffu8, 0xfe, 0x00];
        assert_eq!(compute_content_hash(binary), compute_file_hash(binary));
    }

    #[test]
    fn versioned_file_names() {
        assert!(is_versioned_file_name("DerivedAge-16.0.0.txt"));
        assert!(is_versioned_file_name("emoji-data-15.1.txt"));
        assert!(!is_versioned_file_name("UnicodeData.txt"));
        assert!(!is_versioned_file_name("Blocks-x.txt"));
    }

    #[test]
    fn parse_rejects_malformed_hashes() {
        let json = r#"{"unicodeVersion":"16.0.0","files":{"A.txt":{"hash":"md5:1","fileHash":"md5:1","size":1}}}"#;
        let err = Snapshot::parse(json.as_bytes(), "16.0.0/snapshot.json").unwrap_err();
        assert!(err.to_string().contains(BAD_SCHEMA));
    }
}
