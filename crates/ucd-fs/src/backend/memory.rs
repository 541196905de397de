//! In-memory backend
//!
//! Keeps files in a map keyed by resolved path. Directories are tracked
//! explicitly so that emptied directories survive until removed, the same as
//! on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::bridge::{Backend, Capabilities, FileEntry, RmOptions};
use crate::path::{normalize_base, resolve_safe_path};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// Backend holding everything in process memory.
#[derive(Debug)]
pub struct MemoryBackend {
    root: String,
    capabilities: Capabilities,
    state: RwLock<State>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty backend rooted at `/` with every capability.
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: &str) -> Self {
        Self {
            root: normalize_base(root),
            capabilities: Capabilities::full(),
            state: RwLock::new(State::default()),
        }
    }

    /// Restrict the advertised capabilities, e.g. to emulate a read-only store.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Seed a file, creating its parent directories.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not resolve inside the root; seeding is a
    /// fixture operation and a bad path is a bug in the caller.
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        let resolved = resolve_safe_path(&self.root, path)
            .unwrap_or_else(|e| panic!("invalid seed path {path:?}: {e}"));
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            Self::insert_file(&self.root, &mut state, &resolved, content.as_ref().to_vec());
        }
        self
    }

    /// Snapshot of every stored file path, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.files.keys().cloned().collect()
    }

    fn insert_file(root: &str, state: &mut State, path: &str, content: Vec<u8>) {
        let mut parent = parent_of(path);
        while let Some(dir) = parent {
            if dir.len() <= root.len() {
                break;
            }
            state.dirs.insert(dir.to_string());
            parent = parent_of(dir);
        }
        state.files.insert(path.to_string(), content);
    }

    fn is_dir(&self, state: &State, path: &str) -> bool {
        if path == self.root || state.dirs.contains(path) {
            return true;
        }
        let prefix = dir_prefix(path);
        state.files.keys().any(|k| k.starts_with(&prefix))
    }

    fn list(&self, state: &State, dir: &str, rel: &str, recursive: bool) -> Vec<FileEntry> {
        let prefix = dir_prefix(dir);
        let mut children: BTreeMap<&str, bool> = BTreeMap::new();
        for key in state.files.keys().chain(state.dirs.iter()) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((first, _)) => {
                    children.insert(first, true);
                }
                None => {
                    let is_dir = state.dirs.contains(key.as_str());
                    children.entry(rest).or_insert(is_dir);
                }
            }
        }

        children
            .into_iter()
            .map(|(name, is_dir)| {
                let path = if rel.is_empty() {
                    name.to_string()
                } else {
                    format!("{rel}/{name}")
                };
                if is_dir {
                    let nested = if recursive {
                        self.list(state, &format!("{prefix}{name}"), &path, true)
                    } else {
                        Vec::new()
                    };
                    FileEntry::directory(name, path, nested)
                } else {
                    FileEntry::file(name, path)
                }
            })
            .collect()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.files.get(path).cloned().ok_or_else(|| Error::NotFound {
            path: path.to_string(),
        })
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.files.contains_key(path) || self.is_dir(&state, path))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_dir(&state, path) {
            return Err(Error::io(
                path,
                std::io::Error::other("cannot write file over a directory"),
            ));
        }
        Self::insert_file(&self.root, &mut state, path, data.to_vec());
        Ok(())
    }

    async fn listdir(&self, path: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if !self.is_dir(&state, path) {
            return Err(Error::NotFound {
                path: path.to_string(),
            });
        }
        Ok(self.list(&state, path, "", recursive))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.files.contains_key(path) {
            return Err(Error::io(
                path,
                std::io::Error::other("a file already exists at this path"),
            ));
        }
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.len() <= self.root.len() {
                break;
            }
            state.dirs.insert(dir.to_string());
            current = parent_of(dir);
        }
        Ok(())
    }

    async fn rm(&self, path: &str, options: RmOptions) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.files.remove(path).is_some() {
            return Ok(());
        }
        if !self.is_dir(&state, path) {
            return if options.force {
                Ok(())
            } else {
                Err(Error::NotFound {
                    path: path.to_string(),
                })
            };
        }

        let prefix = dir_prefix(path);
        let has_children = state.files.keys().any(|k| k.starts_with(&prefix))
            || state.dirs.iter().any(|d| d.starts_with(&prefix));
        if has_children && !options.recursive {
            return Err(Error::io(path, std::io::Error::other("directory not empty")));
        }
        state.files.retain(|k, _| !k.starts_with(&prefix));
        state.dirs.retain(|d| d != path && !d.starts_with(&prefix));
        Ok(())
    }
}

fn dir_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}
