//! Version alias resolution

use std::cmp::Ordering;

use semver::Version;

use crate::source::VersionRegistry;
use crate::{Error, Result};

/// Alias for the newest version the registry knows.
pub const LATEST: &str = "latest";

/// Resolve requested versions (possibly aliases) to concrete version names.
///
/// Without a registry, only concrete names can be resolved; they are taken
/// as given.
pub async fn resolve_versions(
    registry: Option<&dyn VersionRegistry>,
    requested: &[String],
) -> Result<Vec<String>> {
    let Some(registry) = registry else {
        if let Some(alias) = requested.iter().find(|v| v.as_str() == LATEST) {
            return Err(Error::UnknownVersion {
                version: alias.clone(),
            });
        }
        return Ok(requested.to_vec());
    };

    let available = registry.list_versions().await?;
    let mut resolved = Vec::with_capacity(requested.len());
    for version in requested {
        let found = if version == LATEST {
            latest(&available)
        } else {
            available.iter().find(|v| *v == version).cloned()
        };
        match found {
            Some(v) if !resolved.contains(&v) => resolved.push(v),
            Some(_) => {}
            None => {
                return Err(Error::UnknownVersion {
                    version: version.clone(),
                });
            }
        }
    }
    Ok(resolved)
}

/// Newest of `versions`, comparing numerically where possible.
pub fn latest(versions: &[String]) -> Option<String> {
    versions
        .iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
}

/// Unicode versions are `major.minor[.patch]`; missing parts count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_version(version: &str) -> Option<Version> {
    let mut parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    parts.resize(3, "0");
    Version::parse(&parts.join(".")).ok()
}
