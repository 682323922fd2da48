use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::{CacheError, DeletionFailure};
use super::loader;
use super::media_cache::{remove_backing_file, MediaCache};

impl MediaCache {
    /// Drop every entry whose backing file no longer exists.
    ///
    /// Returns the number of entries removed. Removals here are not counted
    /// as evictions.
    pub fn validate_integrity(&self) -> Result<usize, CacheError> {
        let mut state = self.state.write();

        let missing: Vec<String> = state
            .index
            .iter()
            .filter(|entry| match fs::metadata(&entry.file_path) {
                Ok(_) => false,
                Err(e) if e.kind() == io::ErrorKind::NotFound => true,
                Err(e) => {
                    warn!("Cannot stat {}: {}", entry.file_path.display(), e);
                    false
                }
            })
            .map(|entry| entry.key.clone())
            .collect();

        for key in &missing {
            debug!("Removing cache entry {} with missing file", key);
            state.detach(key);
        }

        if !missing.is_empty() {
            info!("Integrity check removed {} stale entries", missing.len());
        }
        Ok(missing.len())
    }

    /// Delete files under the cache directory that no entry tracks.
    ///
    /// Every orphan is attempted; failures are collected and reported
    /// together. Returns the number of files deleted. A disabled cache
    /// tracks nothing and leaves the directory alone.
    ///
    /// Tracked paths are compared after resolving `.`, `..` and symlinks, so
    /// an entry stored under another spelling of its path still protects it.
    pub fn cleanup_orphans(&self) -> Result<usize, CacheError> {
        let state = self.state.write();

        if state.is_disabled() {
            debug!("Media cache disabled, skipping orphan cleanup");
            return Ok(0);
        }

        let tracked_paths: HashSet<PathBuf> = state
            .index
            .iter()
            .map(|entry| resolve(&entry.file_path))
            .collect();

        let mut removed = 0;
        let mut failures = Vec::new();

        for file in loader::scan_files(self.cache_dir()) {
            if state.index.contains_key(&file.key)
                || tracked_paths.contains(&resolve(&file.path))
            {
                continue;
            }

            match remove_backing_file(&file.path) {
                Ok(()) => {
                    debug!("Deleted orphaned cache file {}", file.path.display());
                    removed += 1;
                }
                Err(error) => failures.push(DeletionFailure {
                    path: file.path,
                    error,
                }),
            }
        }

        if removed > 0 || !failures.is_empty() {
            info!(
                "Orphan cleanup deleted {} files ({} failures)",
                removed,
                failures.len()
            );
        }

        CacheError::from_failures(failures).map(|()| removed)
    }
}

/// Canonical form of `path`, or the path as given when it cannot be resolved
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
