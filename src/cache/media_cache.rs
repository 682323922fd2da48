use chrono::Utc;
use parking_lot::RwLock;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::{CacheError, DeletionFailure};
use super::index::LruIndex;
use super::loader;
use super::types::{CacheEntry, CacheStats, MediaType};

/// Thread-safe, disk-backed, size-bounded LRU cache of downloaded media files
///
/// The cache never writes media itself. Callers download a blob to disk
/// (ideally at [`MediaCache::path_for_key`]) and hand the path to
/// [`MediaCache::put`]; the cache tracks it and deletes it on eviction.
#[derive(Debug)]
pub struct MediaCache {
    cache_dir: PathBuf,
    pub(super) state: RwLock<CacheState>,
}

/// Everything guarded by the cache lock
#[derive(Debug)]
pub(super) struct CacheState {
    pub index: LruIndex,
    pub max_size: u64,
    /// Always the sum of `file_size` over `index`
    pub current_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheState {
    fn new(max_size: u64) -> Self {
        Self {
            index: LruIndex::new(),
            max_size,
            current_size: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_size == 0
    }

    /// Track every file already under `root`, most recently modified first
    fn load(&mut self, root: &Path) {
        for entry in loader::load_entries(root) {
            self.current_size += entry.file_size;
            self.index.push_back(entry);
        }
        info!(
            "Loaded {} cached media files ({} bytes) from {}",
            self.index.len(),
            self.current_size,
            root.display()
        );
    }

    /// Untrack an entry without counting it as an eviction
    pub fn detach(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.index.remove(key)?;
        self.current_size -= entry.file_size;
        Some(entry)
    }

    /// Untrack the least recently used entry and count the eviction
    fn evict_back(&mut self) -> Option<CacheEntry> {
        let entry = self.index.pop_back()?;
        self.current_size -= entry.file_size;
        self.evictions += 1;
        debug!("Evicted {} ({} bytes)", entry.key, entry.file_size);
        Some(entry)
    }

    /// Evict from the back until the budget holds; a zero limit evicts everything
    fn evict_to(&mut self, limit: u64) -> Vec<DeletionFailure> {
        let mut failures = Vec::new();
        while !self.index.is_empty() && (limit == 0 || self.current_size > limit) {
            let Some(entry) = self.evict_back() else {
                break;
            };
            if let Err(error) = remove_backing_file(&entry.file_path) {
                failures.push(DeletionFailure {
                    path: entry.file_path,
                    error,
                });
            }
        }
        failures
    }
}

/// Delete a backing file; a file that is already gone is not an error
pub(super) fn remove_backing_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl MediaCache {
    /// Create a cache rooted at `cache_dir`, rebuilding its index from the
    /// files already on disk. A `max_size` of zero disables the cache.
    pub fn new(cache_dir: impl Into<PathBuf>, max_size: u64) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|source| CacheError::CreateDirectory {
            path: cache_dir.clone(),
            source,
        })?;

        let mut state = CacheState::new(max_size);

        if state.is_disabled() {
            info!("Media cache disabled (max size 0), skipping load of {}", cache_dir.display());
        } else {
            state.load(&cache_dir);

            if state.current_size > max_size {
                let failures = state.evict_to(max_size);
                info!(
                    "Trimmed media cache to {} bytes ({} evictions)",
                    state.current_size, state.evictions
                );
                for failure in failures {
                    warn!("Failed to delete evicted file {}", failure);
                }
            }
        }

        Ok(Self {
            cache_dir,
            state: RwLock::new(state),
        })
    }

    /// Root directory of the cache
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where a blob for `key` should be written so it is rediscovered after a restart
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    /// Track a downloaded file, inferring its media type from the extension
    /// (or the key). A `size` of zero means "use the file's actual size".
    pub fn put(&self, key: &str, file_path: impl AsRef<Path>, size: u64) -> Result<(), CacheError> {
        let file_path = file_path.as_ref();
        let media_type = MediaType::infer(key, file_path);
        self.put_with_type(key, file_path, size, media_type)
    }

    /// Track a downloaded file whose media type is already known
    pub fn put_with_type(
        &self,
        key: &str,
        file_path: impl AsRef<Path>,
        size: u64,
        media_type: MediaType,
    ) -> Result<(), CacheError> {
        let file_path = file_path.as_ref();
        let mut guard = self.state.write();
        let state = &mut *guard;

        if state.is_disabled() {
            return Ok(());
        }

        let metadata = match fs::metadata(file_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::SourceMissing {
                    path: file_path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let size = if size == 0 { metadata.len() } else { size };

        // Existing key: update in place, no eviction
        if let Some(entry) = state.index.get_mut(key) {
            let old_size = entry.file_size;
            entry.file_path = file_path.to_path_buf();
            entry.file_size = size;
            entry.media_type = media_type;
            entry.access_time = Utc::now();
            state.current_size = state.current_size - old_size + size;
            state.index.promote(key);
            debug!("Updated cached {} ({} -> {} bytes)", key, old_size, size);
            return Ok(());
        }

        while state.current_size.saturating_add(size) > state.max_size {
            let Some(evicted) = state.evict_back() else {
                break;
            };
            if let Err(e) = remove_backing_file(&evicted.file_path) {
                warn!(
                    "Failed to delete evicted file {}: {}",
                    evicted.file_path.display(),
                    e
                );
            }
        }

        if state.current_size.saturating_add(size) > state.max_size {
            return Err(CacheError::CapacityExceeded {
                size,
                max_size: state.max_size,
            });
        }

        state.current_size += size;
        state.index.insert_front(CacheEntry::new(
            key.to_string(),
            file_path.to_path_buf(),
            size,
            media_type,
        ));
        debug!("Cached {} ({} bytes, {})", key, size, media_type);

        Ok(())
    }

    /// Look up a cached file. Entries whose backing file has disappeared are
    /// dropped and reported as a miss.
    pub fn get(&self, key: &str) -> Option<PathBuf> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if state.is_disabled() {
            return None;
        }

        let Some(entry) = state.index.get(key) else {
            state.misses += 1;
            return None;
        };

        if !entry.file_path.exists() {
            debug!("Dropping stale cache entry {}", key);
            state.detach(key);
            state.misses += 1;
            return None;
        }

        state.index.promote(key);
        let entry = state.index.get_mut(key)?;
        entry.access_time = Utc::now();
        state.hits += 1;

        Some(entry.file_path.clone())
    }

    /// Whether `key` is tracked; does not touch recency or counters
    pub fn contains(&self, key: &str) -> bool {
        self.state.read().index.contains_key(key)
    }

    /// Stop tracking `key` and delete its backing file. Unknown keys are ignored.
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write();
        let Some(entry) = state.detach(key) else {
            return Ok(());
        };

        // The file must be gone before the lock is released
        remove_backing_file(&entry.file_path).map_err(|source| CacheError::DeletionFailed {
            path: entry.file_path,
            source,
        })
    }

    /// Remove every entry and delete every backing file. Deletion failures
    /// are collected and reported together after the whole batch ran.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut state = self.state.write();
        let entries = state.index.drain();
        state.current_size = 0;

        let mut failures = Vec::new();
        for entry in entries {
            if let Err(error) = remove_backing_file(&entry.file_path) {
                failures.push(DeletionFailure {
                    path: entry.file_path,
                    error,
                });
            }
        }
        info!("Cleared media cache ({} failures)", failures.len());

        CacheError::from_failures(failures)
    }

    /// Evict exactly one entry, the least recently used
    pub fn evict(&self) -> Result<CacheEntry, CacheError> {
        let mut state = self.state.write();
        let entry = state.evict_back().ok_or(CacheError::Empty)?;

        match remove_backing_file(&entry.file_path) {
            Ok(()) => Ok(entry),
            Err(source) => Err(CacheError::DeletionFailed {
                path: entry.file_path,
                source,
            }),
        }
    }

    /// Change the byte budget, evicting from the back until it holds.
    /// A limit of zero evicts everything and disables the cache.
    ///
    /// Re-enabling a disabled cache adopts the files already in the cache
    /// directory, as a restart with the new limit would.
    pub fn set_max_size(&self, max_size: u64) -> Result<(), CacheError> {
        let mut state = self.state.write();
        let was_disabled = state.is_disabled();
        state.max_size = max_size;

        if was_disabled && !state.is_disabled() && state.index.is_empty() {
            state.load(&self.cache_dir);
        }

        let before = state.index.len();
        let failures = state.evict_to(max_size);
        if before != state.index.len() {
            info!(
                "Resized media cache to {} bytes, evicted {} entries",
                max_size,
                before - state.index.len()
            );
        }

        CacheError::from_failures(failures)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        let oldest_access_time = state.index.iter().map(|e| e.access_time).min();
        let newest_access_time = state.index.iter().map(|e| e.access_time).max();

        CacheStats {
            total_size: state.current_size,
            max_size: state.max_size,
            file_count: state.index.len(),
            hit_count: state.hits,
            miss_count: state.misses,
            eviction_count: state.evictions,
            oldest_access_time,
            newest_access_time,
        }
    }

    /// Bytes currently tracked
    pub fn size(&self) -> u64 {
        self.state.read().current_size
    }

    /// Number of tracked entries
    pub fn count(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn max_size(&self) -> u64 {
        self.state.read().max_size
    }

    /// Snapshot of all entries, most recently used first
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.state.read().index.iter().cloned().collect()
    }
}
