//! Store-relative path helpers
//!
//! All paths here are bridge paths, relative to the bridge root. The bridge
//! resolves and validates them against its root; [`confine`] keeps per-file
//! paths inside their version directory.

use ucd_fs::resolve_safe_path;

use crate::{Error, Result};

/// Join two bridge-relative paths, skipping empty sides.
pub(crate) fn join(base: &str, rel: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = rel.trim_start_matches('/');
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rel}"),
    }
}

/// Parent directories of a relative file path, deepest first.
///
/// `a/b/c.txt` yields `a/b`, `a`. The empty root is not included.
pub(crate) fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut current = path.trim_matches('/');
    std::iter::from_fn(move || {
        let (parent, _) = current.rsplit_once('/')?;
        current = parent;
        Some(parent)
    })
}

/// Normalize a version-relative file path without letting it leave the
/// version directory.
///
/// Resolving against a virtual root makes any `..` that climbs past the
/// version fail with `PathTraversal`. A path that resolves to the version
/// directory itself is rejected.
pub(crate) fn confine(relative: &str) -> Result<String> {
    let resolved = resolve_safe_path("/", relative)?;
    let resolved = resolved.trim_start_matches('/');
    if resolved.is_empty() {
        return Err(Error::InvalidFilePath {
            path: relative.to_string(),
        });
    }
    Ok(resolved.to_string())
}
