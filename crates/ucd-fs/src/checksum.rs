//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used for
//! snapshot entries and drift detection.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
pub const PREFIX: &str = "sha256:";

/// Length of a full checksum string: prefix plus 64 hex digits.
pub const CHECKSUM_LEN: usize = PREFIX.len() + 64;

/// Compute the SHA-256 checksum of text or binary content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`. Text and
/// binary inputs with the same bytes produce the same checksum.
pub fn compute_file_hash(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Check that `value` is a canonical checksum (`sha256:` + 64 lowercase hex).
pub fn is_valid_checksum(value: &str) -> bool {
    value.len() == CHECKSUM_LEN
        && value.strip_prefix(PREFIX).is_some_and(|hex| {
            hex.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
}
