//! Safe path resolution against a base directory
//!
//! Every path handed to a bridge goes through [`resolve_safe_path`] before a
//! backend sees it. Resolution is purely lexical: nothing touches the disk and
//! symlinks are never followed. Internally all paths use forward slashes.

use crate::{Error, Result};

/// Upper bound on percent-decoding rounds (covers double/triple encoding).
const MAX_DECODE_ROUNDS: usize = 10;

/// Resolve `requested` against `base`, rejecting anything that could escape it.
///
/// Checks run in a fixed order:
///
/// 1. null bytes and ASCII control characters are rejected
/// 2. percent escapes are decoded until stable, then re-checked
/// 3. backslashes become forward slashes
/// 4. an empty or whitespace-only request resolves to `base`
/// 5. a request already under `base` is taken relative to it; other
///    absolute-looking prefixes (`//host`, `C:`, `@host`, `:port`) are folded
///    into the root instead of being honoured
/// 6. `.` and `..` are resolved lexically; climbing above `base` fails
///
/// # Errors
///
/// [`Error::IllegalCharacterInPath`], [`Error::FailedToDecodePath`] or
/// [`Error::PathTraversal`].
pub fn resolve_safe_path(base: &str, requested: &str) -> Result<String> {
    reject_control_chars(requested, requested)?;
    let decoded = decode_path(requested)?;
    reject_control_chars(&decoded, requested)?;

    let base = normalize_base(base);
    let normalized = decoded.replace('\\', "/");
    if normalized.trim().is_empty() {
        return Ok(base);
    }

    let traversal = || Error::PathTraversal {
        base: base.clone(),
        requested: requested.to_string(),
    };

    let relative = fold_into_base(&base, &normalized);
    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(traversal());
                }
            }
            other => segments.push(other),
        }
    }

    let resolved = join_base(&base, &segments.join("/"));
    if !is_within_base(&base, &resolved) {
        return Err(traversal());
    }
    Ok(resolved)
}

/// Check whether `path` equals `base` or lies underneath it.
pub fn is_within_base(base: &str, path: &str) -> bool {
    let base = normalize_base(base);
    if base.ends_with('/') {
        return path.starts_with(&base) || path == base.trim_end_matches('/');
    }
    path == base
        || path
            .strip_prefix(&base)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Strip `base` from an already-resolved path, yielding a relative path.
pub fn relative_to(base: &str, path: &str) -> Option<String> {
    let base = normalize_base(base);
    if path == base {
        return Some(String::new());
    }
    let rest = path.strip_prefix(&base)?;
    if base.ends_with('/') {
        Some(rest.to_string())
    } else {
        rest.strip_prefix('/').map(str::to_string)
    }
}

fn reject_control_chars(candidate: &str, original: &str) -> Result<()> {
    if candidate.chars().any(|c| c.is_ascii_control()) {
        return Err(Error::IllegalCharacterInPath {
            path: original.escape_debug().to_string(),
        });
    }
    Ok(())
}

fn decode_path(path: &str) -> Result<String> {
    let mut current = path.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = percent_decode_once(&current).ok_or_else(|| Error::FailedToDecodePath {
            path: path.to_string(),
        })?;
        if decoded == current {
            return Ok(current);
        }
        current = decoded;
    }
    Err(Error::FailedToDecodePath {
        path: path.to_string(),
    })
}

fn percent_decode_once(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Normalize a base directory: forward slashes, no trailing slash except
/// for a bare root (`/` or `C:/`).
pub(crate) fn normalize_base(base: &str) -> String {
    let mut normalized = base.replace('\\', "/");
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    if normalized.is_empty() {
        return "/".to_string();
    }
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if is_drive_letter(trimmed) {
        format!("{trimmed}/")
    } else {
        trimmed.to_string()
    }
}

fn fold_into_base<'a>(base: &str, path: &'a str) -> &'a str {
    let base_trimmed = base.trim_end_matches('/');
    if !base_trimmed.is_empty() {
        if path == base_trimmed {
            return "";
        }
        if let Some(rest) = path.strip_prefix(base_trimmed)
            && rest.starts_with('/')
        {
            return rest;
        }
    }

    let mut rest = path;
    if rest.get(..2).is_some_and(is_drive_letter) {
        rest = &rest[2..];
    }
    rest.trim_start_matches(['/', '@', ':'])
}

fn is_drive_letter(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn join_base(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{base}{relative}")
    } else {
        format!("{base}/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_double_encoding() {
        assert_eq!(decode_path("%252E%252E").unwrap(), "..");
    }

    #[test]
    fn leaves_stray_percent_alone() {
        assert_eq!(decode_path("100%").unwrap(), "100%");
        assert_eq!(decode_path("%zz").unwrap(), "%zz");
    }

    #[test]
    fn normalize_base_variants() {
        assert_eq!(normalize_base(""), "/");
        assert_eq!(normalize_base("/"), "/");
        assert_eq!(normalize_base("/srv/ucd/"), "/srv/ucd");
        assert_eq!(normalize_base("C:\\data\\"), "C:/data");
        assert_eq!(normalize_base("C:\\"), "C:/");
    }

    #[test]
    fn relative_to_strips_base() {
        assert_eq!(relative_to("/srv", "/srv/a/b").as_deref(), Some("a/b"));
        assert_eq!(relative_to("/", "/a").as_deref(), Some("a"));
        assert_eq!(relative_to("/srv", "/srv").as_deref(), Some(""));
        assert_eq!(relative_to("/srv", "/srvx/a"), None);
    }
}
