//! Persistent executable-path cache
//!
//! A JSON object mapping lowercase executable names to absolute paths.
//! Validity is re-checked on every lookup, never cached: a stale entry is
//! purged before any alternative action is taken. Persistence is a
//! whole-file overwrite after each mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory cache plus its on-disk mirror
pub struct ExecCache {
    path: PathBuf,
    entries: HashMap<String, PathBuf>,
}

impl ExecCache {
    /// Load the cache from disk; absent or corrupt files yield an empty cache
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let entries: HashMap<String, PathBuf> = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache file corrupt, starting empty");
                    None
                }
            })
            .unwrap_or_default();

        tracing::debug!(entries = entries.len(), path = %path.display(), "executable cache loaded");
        Self { path, entries }
    }

    /// Look up a name, verifying the stored path still exists
    ///
    /// A stale entry is purged (and the purge persisted) before `None` is
    /// returned, so no caller can ever act on it.
    pub fn lookup_valid(&mut self, name: &str) -> Option<PathBuf> {
        let key = normalize_key(name);
        let path = self.entries.get(&key)?.clone();

        if path.exists() {
            return Some(path);
        }

        tracing::info!(name = %key, path = %path.display(), "purging stale cache entry");
        self.entries.remove(&key);
        self.persist();
        None
    }

    /// Record a freshly resolved path and persist
    pub fn insert(&mut self, name: &str, path: PathBuf) {
        self.entries.insert(normalize_key(name), path);
        self.persist();
    }

    /// Drop an entry (e.g. after a failed launch) and persist
    pub fn invalidate(&mut self, name: &str) {
        if self.entries.remove(&normalize_key(name)).is_some() {
            self.persist();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The cache file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whole-file overwrite; failure is logged, the in-memory cache stays
    /// authoritative until the next successful write
    fn persist(&self) {
        let result = serde_json::to_string_pretty(&self.entries)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));

        if let Err(e) = result {
            tracing::error!(path = %self.path.display(), error = %e, "cache persist failed");
        }
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}
