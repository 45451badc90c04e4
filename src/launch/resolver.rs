//! Executable resolution
//!
//! Maps a logical executable name to a validated filesystem path: cache
//! first (with a fresh existence check), then the PATH, then a
//! depth-bounded directory search across the configured roots.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use walkdir::WalkDir;

use super::cache::ExecCache;

/// Resolution seam between the supervisor and the filesystem
pub trait Resolve: Send + Sync {
    /// Cache-only lookup with a fresh existence check; purges stale entries
    fn cached(&self, name: &str) -> Option<PathBuf>;

    /// Full resolution: cache, PATH, then bounded search. Blocking; run on
    /// a worker. On success the mapping is cached and persisted; on failure
    /// the cache is left unchanged.
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Drop a cache entry (after a failed launch)
    fn invalidate(&self, name: &str);
}

/// Filesystem-backed resolver with a mutex-guarded persistent cache
pub struct ExecutableResolver {
    cache: Mutex<ExecCache>,
    roots: Vec<PathBuf>,
    max_depth: usize,
}

impl ExecutableResolver {
    #[must_use]
    pub fn new(cache: ExecCache, roots: Vec<PathBuf>, max_depth: usize) -> Self {
        Self {
            cache: Mutex::new(cache),
            roots,
            max_depth,
        }
    }

    /// Depth-bounded search across the roots; first match wins
    fn search_roots(&self, name: &str) -> Option<PathBuf> {
        for root in &self.roots {
            if !root.exists() {
                continue;
            }

            tracing::debug!(root = %root.display(), name, depth = self.max_depth, "searching");

            let found = WalkDir::new(root)
                .max_depth(self.max_depth)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .find(|entry| entry.file_type().is_file() && file_name_matches(entry.path(), name));

            if let Some(entry) = found {
                return Some(entry.into_path());
            }
        }

        None
    }
}

impl Resolve for ExecutableResolver {
    fn cached(&self, name: &str) -> Option<PathBuf> {
        self.cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.lookup_valid(name))
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.cached(name) {
            return Some(path);
        }

        // PATH fast path before walking the roots
        let found = which::which(name)
            .ok()
            .filter(|p| p.is_file())
            .or_else(|| self.search_roots(name))?;

        tracing::info!(name, path = %found.display(), "executable resolved");
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(name, found.clone());
        }
        Some(found)
    }

    fn invalidate(&self, name: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.invalidate(name);
        }
    }
}

/// Case-insensitive, extension-aware filename match: the full name must
/// match, or the requested name must match the file stem exactly.
fn file_name_matches(path: &Path, requested: &str) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if file_name.eq_ignore_ascii_case(requested) {
        return true;
    }

    // "pycharm64" should match "pycharm64.exe" but not "pycharm64.txt.bak"
    if !requested.contains('.') {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            return stem.eq_ignore_ascii_case(requested);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_for(dir: &Path, depth: usize) -> ExecutableResolver {
        let cache = ExecCache::load(dir.join("cache.json"));
        ExecutableResolver::new(cache, vec![dir.to_path_buf()], depth)
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn finds_nested_executable_within_depth() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("apps/vendor/chrome.exe");
        touch(&target);

        let resolver = resolver_for(dir.path(), 4);
        assert_eq!(resolver.resolve("chrome.exe"), Some(target));
    }

    #[test]
    fn depth_cap_is_a_hard_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/deep.exe");
        touch(&target);

        // depth 2 cannot reach a file 3 levels down
        let shallow = resolver_for(dir.path(), 2);
        assert_eq!(shallow.resolve("deep.exe"), None);

        let deep = resolver_for(dir.path(), 3);
        assert_eq!(deep.resolve("deep.exe"), Some(target));
    }

    #[test]
    fn match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tools/Chrome.EXE");
        touch(&target);

        let resolver = resolver_for(dir.path(), 3);
        assert_eq!(resolver.resolve("chrome.exe"), Some(target));
    }

    #[test]
    fn bare_name_matches_stem() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bin/pycharm64.exe");
        touch(&target);

        let resolver = resolver_for(dir.path(), 3);
        assert_eq!(resolver.resolve("pycharm64"), Some(target));
    }

    #[test]
    fn success_is_written_to_the_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("apps/tool.exe");
        touch(&target);

        let resolver = resolver_for(dir.path(), 3);
        resolver.resolve("tool.exe").unwrap();

        let mut reloaded = ExecCache::load(dir.path().join("cache.json"));
        assert_eq!(reloaded.lookup_valid("tool.exe"), Some(target));
    }

    #[test]
    fn failure_leaves_cache_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_for(dir.path(), 3);

        assert_eq!(resolver.resolve("missing-fictional-tool.xyz"), None);

        let reloaded = ExecCache::load(dir.path().join("cache.json"));
        assert!(reloaded.is_empty());
    }

    #[test]
    fn stale_cache_entry_never_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("old/location.exe");
        let fresh = dir.path().join("new/location.exe");
        touch(&fresh);

        let mut cache = ExecCache::load(dir.path().join("cache.json"));
        cache.insert("location.exe", stale.clone());
        let resolver = ExecutableResolver::new(cache, vec![dir.path().to_path_buf()], 3);

        let resolved = resolver.resolve("location.exe");
        assert_eq!(resolved, Some(fresh));
        assert_ne!(resolved, Some(stale));
    }
}
